//! OpenVR + Direct3D 11 backend.
//!
//! Requires a running SteamVR; `openvr_api.dll` is loaded through
//! `openvr_sys`. The runtime is reached through its C function tables
//! (`FnTable:IVRSystem_…`), the same way the official C bindings do.
//!
//! # Ownership
//!
//! The shader-resource view returned by `GetMirrorTextureD3D11` belongs to
//! the runtime and is released by `VR_Shutdown`, so it is wrapped in
//! `ManuallyDrop` and never released here. Everything else is a COM
//! reference released on drop, except the device, whose final `Release`
//! return value is checked for leaks.

use std::cell::Cell;
use std::ffi::{c_void, CStr};
use std::mem::{size_of, ManuallyDrop};
use std::os::raw::c_char;
use std::ptr;

use anyhow::{Context, Result};
use openvr_sys as sys;
use windows::{
    core::{IUnknown_Vtbl, Interface},
    Win32::{
        Graphics::{
            Direct3D::D3D_DRIVER_TYPE_HARDWARE,
            Direct3D11::{
                D3D11CreateDevice, ID3D11Device, ID3D11DeviceContext, ID3D11Resource,
                ID3D11ShaderResourceView, ID3D11Texture2D, D3D11_BOX, D3D11_CREATE_DEVICE_FLAG,
                D3D11_RESOURCE_MISC_SHARED, D3D11_SDK_VERSION, D3D11_TEXTURE2D_DESC,
            },
            Dxgi::{Common::DXGI_FORMAT_R8G8B8A8_UNORM, IDXGIResource},
        },
    },
};

use vrmirror_core::{CaptureError, CropRect, Extent, Eye, SharedHandle};

use crate::backend::{MirrorBackend, RuntimeEvent};

// ── Handle types ──────────────────────────────────────────────────────────────

/// Auxiliary device dedicated to one session.
pub struct D3d11Device {
    device:  ID3D11Device,
    context: ID3D11DeviceContext,
}

/// Runtime-owned mirror view; invalid after `VR_Shutdown`.
pub struct MirrorView(ManuallyDrop<ID3D11ShaderResourceView>);

pub struct MirrorResource {
    resource: ID3D11Resource,
    desc:     D3D11_TEXTURE2D_DESC,
}

// ── SteamVrBackend ────────────────────────────────────────────────────────────

pub struct SteamVrBackend {
    system:     Cell<*const sys::VR_IVRSystem_FnTable>,
    compositor: Cell<*const sys::VR_IVRCompositor_FnTable>,
}

impl Default for SteamVrBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SteamVrBackend {
    pub fn new() -> Self {
        Self {
            system:     Cell::new(ptr::null()),
            compositor: Cell::new(ptr::null()),
        }
    }

    fn compositor(&self) -> Option<&sys::VR_IVRCompositor_FnTable> {
        // SAFETY: non-null only between a successful connect and shutdown.
        unsafe { self.compositor.get().as_ref() }
    }

    fn system(&self) -> Option<&sys::VR_IVRSystem_FnTable> {
        // SAFETY: as above; refreshed by `system_available`.
        unsafe { self.system.get().as_ref() }
    }
}

impl MirrorBackend for SteamVrBackend {
    type Device = D3d11Device;
    type MirrorView = MirrorView;
    type Resource = MirrorResource;
    type Texture = ID3D11Texture2D;

    fn connect(&self) -> Result<(), CaptureError> {
        let mut err = sys::EVRInitError_VRInitError_None;
        unsafe { sys::VR_InitInternal(&mut err, sys::EVRApplicationType_VRApplication_Background) };
        if err != sys::EVRInitError_VRInitError_None {
            return Err(CaptureError::RuntimeUnavailable { reason: init_error_text(err) });
        }

        let system = fn_table::<sys::VR_IVRSystem_FnTable>(sys::IVRSystem_Version);
        let compositor = fn_table::<sys::VR_IVRCompositor_FnTable>(sys::IVRCompositor_Version);
        match (system, compositor) {
            (Some(system), Some(compositor)) => {
                self.system.set(system);
                self.compositor.set(compositor);
                Ok(())
            }
            _ => {
                unsafe { sys::VR_ShutdownInternal() };
                Err(CaptureError::RuntimeUnavailable {
                    reason: "IVRSystem / IVRCompositor interface missing".into(),
                })
            }
        }
    }

    fn shutdown(&self) {
        self.system.set(ptr::null());
        self.compositor.set(ptr::null());
        unsafe { sys::VR_ShutdownInternal() };
    }

    fn system_available(&self) -> bool {
        if self.system.get().is_null() {
            return false;
        }
        // Re-resolve: the runtime may have been restarted or torn down.
        let system = fn_table::<sys::VR_IVRSystem_FnTable>(sys::IVRSystem_Version);
        self.system.set(system.unwrap_or(ptr::null()));
        system.is_some()
    }

    fn poll_event(&self) -> Option<RuntimeEvent> {
        let poll = self.system()?.PollNextEvent?;
        // SAFETY: VREvent_t is plain data; all-zero is a valid value.
        let mut event: sys::VREvent_t = unsafe { std::mem::zeroed() };
        let got = unsafe { poll(&mut event, size_of::<sys::VREvent_t>() as u32) };
        if !got {
            return None;
        }
        if event.eventType == sys::EVREventType_VREvent_Quit as u32 {
            Some(RuntimeEvent::Quit)
        } else {
            Some(RuntimeEvent::Other(event.eventType))
        }
    }

    fn create_device(&self) -> Result<D3d11Device, CaptureError> {
        let mut device: Option<ID3D11Device> = None;
        let mut context: Option<ID3D11DeviceContext> = None;
        unsafe {
            D3D11CreateDevice(
                None,
                D3D_DRIVER_TYPE_HARDWARE,
                None,
                D3D11_CREATE_DEVICE_FLAG::default(),
                None,
                D3D11_SDK_VERSION,
                Some(&mut device),
                None,
                Some(&mut context),
            )
        }
        .context("D3D11CreateDevice")
        .map_err(|e| CaptureError::DeviceCreation { reason: format!("{e:#}") })?;

        match (device, context) {
            (Some(device), Some(context)) => Ok(D3d11Device { device, context }),
            _ => Err(CaptureError::DeviceCreation { reason: "D3D11CreateDevice returned no device".into() }),
        }
    }

    fn mirror_view(&self, device: &D3d11Device, eye: Eye) -> Result<MirrorView, CaptureError> {
        let missing = |reason: &str| CaptureError::MirrorTexture { eye, reason: reason.to_owned() };
        let get_mirror = self
            .compositor()
            .and_then(|c| c.GetMirrorTextureD3D11)
            .ok_or_else(|| missing("compositor interface unavailable"))?;

        let vr_eye = match eye {
            Eye::Left => sys::EVREye_Eye_Left,
            Eye::Right => sys::EVREye_Eye_Right,
        };
        let mut srv: *mut c_void = ptr::null_mut();
        let err = unsafe { get_mirror(vr_eye, device.device.as_raw(), &mut srv) };
        if err != sys::EVRCompositorError_VRCompositorError_None {
            return Err(missing(&format!("GetMirrorTextureD3D11 error {err}")));
        }
        if srv.is_null() {
            return Err(missing("GetMirrorTextureD3D11 returned null"));
        }

        // SAFETY: the compositor hands out a live view for `device`.
        let view = unsafe { ID3D11ShaderResourceView::from_raw(srv) };
        Ok(MirrorView(ManuallyDrop::new(view)))
    }

    fn mirror_resource(&self, view: &MirrorView) -> Result<(MirrorResource, Extent), CaptureError> {
        let resource = describe_mirror(&view.0)
            .map_err(|e| CaptureError::MirrorResource { reason: format!("{e:#}") })?;
        let extent = Extent::new(resource.desc.Width, resource.desc.Height);
        Ok((resource, extent))
    }

    fn create_crop_texture(
        &self,
        device: &D3d11Device,
        source: &MirrorResource,
        extent: Extent,
    ) -> Result<ID3D11Texture2D, CaptureError> {
        // UNORM rather than the mirror's sRGB format: the host then applies
        // the sRGB curve exactly once when sampling.
        let desc = D3D11_TEXTURE2D_DESC {
            Width:     extent.width,
            Height:    extent.height,
            MipLevels: 1,
            ArraySize: 1,
            Format:    DXGI_FORMAT_R8G8B8A8_UNORM,
            MiscFlags: source.desc.MiscFlags | D3D11_RESOURCE_MISC_SHARED.0 as u32,
            ..source.desc
        };

        let mut texture: Option<ID3D11Texture2D> = None;
        unsafe { device.device.CreateTexture2D(&desc, None, Some(&mut texture)) }
            .context("CreateTexture2D")
            .and_then(|()| texture.context("CreateTexture2D returned no texture"))
            .map_err(|e| CaptureError::TextureCreation { reason: format!("{e:#}") })
    }

    fn shared_handle(&self, texture: &ID3D11Texture2D) -> Result<SharedHandle, CaptureError> {
        let share = || -> Result<SharedHandle> {
            let dxgi: IDXGIResource = texture.cast().context("QueryInterface IDXGIResource")?;
            let handle = unsafe { dxgi.GetSharedHandle() }.context("GetSharedHandle")?;
            Ok(SharedHandle(handle.0 as usize as u64))
        };
        share().map_err(|e| CaptureError::SharedHandle { reason: format!("{e:#}") })
    }

    fn copy_region(&self, device: &D3d11Device, dst: &ID3D11Texture2D, src: &MirrorResource, rect: CropRect) {
        let region = D3D11_BOX {
            left:   rect.x,
            top:    rect.y,
            front:  0,
            right:  rect.right(),
            bottom: rect.bottom(),
            back:   1,
        };
        unsafe {
            device
                .context
                .CopySubresourceRegion(dst, 0, 0, 0, 0, &src.resource, 0, Some(&region as *const _));
        }
    }

    fn flush(&self, device: &D3d11Device) {
        unsafe { device.context.Flush() };
    }

    fn release_device(&self, device: D3d11Device) -> u32 {
        let D3d11Device { device, context } = device;
        drop(context);

        let raw = device.into_raw();
        // SAFETY: `raw` is the last reference this crate owns; every COM
        // vtable starts with IUnknown.
        unsafe {
            let vtable = *(raw as *const *const IUnknown_Vtbl);
            ((*vtable).Release)(raw)
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Resolve `FnTable:<version>` from the loaded runtime.
fn fn_table<T>(version: &[u8]) -> Option<*const T> {
    let mut name = b"FnTable:".to_vec();
    name.extend_from_slice(version);
    if name.last() != Some(&0) {
        name.push(0);
    }

    let mut err = sys::EVRInitError_VRInitError_None;
    let table = unsafe { sys::VR_GetGenericInterface(name.as_ptr() as *const c_char, &mut err) } as *const T;
    (err == sys::EVRInitError_VRInitError_None && !table.is_null()).then_some(table)
}

fn init_error_text(err: sys::EVRInitError) -> String {
    let text = unsafe { sys::VR_GetVRInitErrorAsEnglishDescription(err) };
    if text.is_null() {
        return format!("init error {err}");
    }
    // SAFETY: the runtime returns a static NUL-terminated string.
    unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
}

fn describe_mirror(view: &ID3D11ShaderResourceView) -> Result<MirrorResource> {
    let resource: ID3D11Resource = unsafe { view.GetResource() }.context("GetResource")?;

    let texture: ID3D11Texture2D = resource.cast().context("QueryInterface ID3D11Texture2D")?;
    let mut desc = D3D11_TEXTURE2D_DESC::default();
    unsafe { texture.GetDesc(&mut desc) };

    Ok(MirrorResource { resource, desc })
}
