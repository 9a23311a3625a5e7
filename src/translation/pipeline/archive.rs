//! Zip archives of translation files.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::translation::error::BabeleResult;

/// Every `*.json` file in the archive as `(entry name, contents)`, in archive order
pub fn extract_json_files(bytes: &[u8]) -> BabeleResult<Vec<(String, Vec<u8>)>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut files = Vec::new();

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if !file.is_file() || !file.name().to_ascii_lowercase().ends_with(".json") {
            continue;
        }

        let name = file.name().to_string();
        let mut contents = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
        file.read_to_end(&mut contents)?;
        files.push((name, contents));
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::error::BabeleError;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    #[test]
    fn test_extracts_json_entries_only() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = ZipWriter::new(&mut buffer);
            let options = SimpleFileOptions::default();
            writer.start_file("lang/de/dnd5e.items.json", options).unwrap();
            writer.write_all(br#"{"label": "Gegenstaende"}"#).unwrap();
            writer.start_file("lang/de/notes.txt", options).unwrap();
            writer.write_all(b"ignored").unwrap();
            writer.finish().unwrap();
        }

        let files = extract_json_files(buffer.get_ref()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "lang/de/dnd5e.items.json");
        assert_eq!(files[0].1, br#"{"label": "Gegenstaende"}"#.to_vec());
    }

    #[test]
    fn test_corrupt_archive_is_an_archive_error() {
        let result = extract_json_files(b"definitely not a zip file");
        assert!(matches!(result, Err(BabeleError::Archive(_))));
    }
}
