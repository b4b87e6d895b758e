use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Write a zip archive at `path` holding the given `(name, contents)` entries.
pub fn write_archive(path: &Path, entries: &[(&str, &str)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    for (name, contents) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

pub fn manifest(main_class: &str) -> String {
    format!("Manifest-Version: 1.0\r\nMain-Class: {}\r\n\r\n", main_class)
}
