//! Crop preset list.
//!
//! One preset per line, `top,bottom,left,right,name`, pixel offsets for the
//! right eye. The list is read once when the module loads and never changes
//! afterwards.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::PresetError;
use crate::types::CropRegion;

/// Presets file name, looked up next to the module.
pub const PRESETS_FILE: &str = "win-openvr-presets.ini";

/// Longest stored preset name in bytes.
pub const PRESET_NAME_MAX: usize = 127;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropPreset {
    pub name: String,
    pub region: CropRegion,
}

/// Parse presets until the first malformed line.
///
/// Records read before a malformed line are kept; the rest of the input is
/// ignored and a warning is logged.
pub fn parse_presets(reader: impl BufRead) -> Vec<CropPreset> {
    let mut presets = Vec::new();

    // Split on raw bytes: names may be in a legacy code page.
    for (index, line) in reader.split(b'\n').enumerate() {
        let bytes = match line {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Crop presets: read error after {} presets: {}", presets.len(), e);
                break;
            }
        };
        let line = String::from_utf8_lossy(&bytes);
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line, index + 1) {
            Ok(preset) => presets.push(preset),
            Err(e) => {
                warn!("Crop presets: {} (keeping {} presets)", e, presets.len());
                break;
            }
        }
    }

    presets
}

/// Load the preset file at `path`. A missing file yields an empty list.
pub fn load_presets(path: &Path) -> Vec<CropPreset> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn!("Failed to load presets file '{}': {}", path.display(), e);
            return Vec::new();
        }
    };

    let presets = parse_presets(BufReader::new(file));
    info!("Loaded {} crop presets from {}", presets.len(), path.display());
    presets
}

fn parse_line(line: &str, line_no: usize) -> Result<CropPreset, PresetError> {
    let mut fields = line.trim_end_matches('\r').splitn(5, ',');
    let mut offset = || -> Result<u32, PresetError> {
        let raw = fields.next().ok_or(PresetError::MissingField { line: line_no })?.trim();
        raw.parse().map_err(|_| PresetError::InvalidOffset { line: line_no, value: raw.to_owned() })
    };

    let top = offset()?;
    let bottom = offset()?;
    let left = offset()?;
    let right = offset()?;

    let name = fields.next().ok_or(PresetError::MissingField { line: line_no })?.trim();
    if name.is_empty() {
        return Err(PresetError::EmptyName { line: line_no });
    }

    Ok(CropPreset {
        name: truncate_name(name).to_owned(),
        region: CropRegion { top, left, bottom, right },
    })
}

fn truncate_name(name: &str) -> &str {
    if name.len() <= PRESET_NAME_MAX {
        return name;
    }
    let mut end = PRESET_NAME_MAX;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_in_file_order() {
        let input = "100,50,200,300,Valve Index\n0,0,0,0,Full frame\n";
        let presets = parse_presets(input.as_bytes());
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[0].name, "Valve Index");
        assert_eq!(presets[0].region, CropRegion { top: 100, bottom: 50, left: 200, right: 300 });
        assert_eq!(presets[1].name, "Full frame");
        assert_eq!(presets[1].region, CropRegion::NONE);
    }

    #[test]
    fn name_keeps_commas_and_drops_carriage_return() {
        let presets = parse_presets("1,2,3,4,Quest 2, Link, wide\r\n".as_bytes());
        assert_eq!(presets[0].name, "Quest 2, Link, wide");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let presets = parse_presets("\n1,2,3,4,A\n\n5,6,7,8,B".as_bytes());
        let names: Vec<_> = presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn non_utf8_names_are_decoded_lossily() {
        let input: &[u8] = b"1,2,3,4,Good\n5,6,7,8,Rift \xe9dition\n9,9,9,9,After\n";
        let presets = parse_presets(input);
        let names: Vec<_> = presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Good", "Rift \u{FFFD}dition", "After"]);
        assert_eq!(presets[1].region, CropRegion { top: 5, bottom: 6, left: 7, right: 8 });
    }

    #[test]
    fn non_utf8_offset_stops_parsing() {
        let input: &[u8] = b"1,2,3,4,Good\n5,\xe96,7,8,Bad\n9,9,9,9,After\n";
        let presets = parse_presets(input);
        assert_eq!(presets.len(), 1);
    }

    #[test]
    fn malformed_line_stops_parsing() {
        let input = "1,2,3,4,Good\n1,2,x,4,Bad\n5,6,7,8,Never read\n";
        let presets = parse_presets(input.as_bytes());
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].name, "Good");
    }

    #[test]
    fn malformed_first_line_yields_empty_list() {
        assert!(parse_presets("not a preset at all\n1,2,3,4,Ok\n".as_bytes()).is_empty());
        assert!(parse_presets("-1,0,0,0,Negative\n".as_bytes()).is_empty());
        assert!(parse_presets("1,2,3,4,\n".as_bytes()).is_empty());
    }

    #[test]
    fn line_errors_name_the_problem() {
        assert_eq!(parse_line("1,2,3", 7), Err(PresetError::MissingField { line: 7 }));
        assert_eq!(
            parse_line("1,2,abc,4,x", 2),
            Err(PresetError::InvalidOffset { line: 2, value: "abc".into() })
        );
    }

    #[test]
    fn long_names_are_truncated_on_char_boundary() {
        let long = "é".repeat(100);
        let presets = parse_presets(format!("0,0,0,0,{long}\n").as_bytes());
        let name = &presets[0].name;
        assert!(name.len() <= PRESET_NAME_MAX);
        assert_eq!(name.chars().count(), 63);
    }

    #[test]
    fn missing_file_yields_empty_list() {
        let path = std::env::temp_dir().join("vrmirror-presets-that-do-not-exist.ini");
        assert!(load_presets(&path).is_empty());
    }

    #[test]
    fn loads_presets_from_disk() {
        let path = std::env::temp_dir().join(format!("vrmirror-presets-{}.ini", std::process::id()));
        std::fs::write(&path, "10,20,30,40,Disk\n").unwrap();
        let presets = load_presets(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].region.right, 40);
    }
}
