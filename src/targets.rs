use std::path::Path;

/// Marker extension appended to a file's full name once it is encrypted
pub const ENCRYPTED_EXTENSION: &str = "ft";

/// Extensions the simulation treats as interesting: the WannaCry target
/// set (office documents, text, images, audio/video, archives, databases,
/// source files). Fixed for the process lifetime; matching is
/// case-sensitive.
pub const TARGET_EXTENSIONS: &[&str] = &[
    "der", "pfx", "key", "crt", "csr", "p12", "pem", "odt", "ott", "sxw", "stw", "uot", "3ds",
    "max", "3dm", "ods", "ots", "sxc", "stc", "dif", "slk", "wb2", "odp", "otp", "sxd", "std",
    "uop", "odg", "otg", "sxm", "mml", "lay", "lay6", "asc", "sqlite3", "sqlitedb", "sql",
    "accdb", "mdb", "db", "dbf", "odb", "frm", "myd", "myi", "ibd", "mdf", "ldf", "sln", "suo",
    "cs", "c", "cpp", "pas", "h", "asm", "js", "cmd", "bat", "ps1", "vbs", "vb", "pl", "dip",
    "dch", "sch", "brd", "jsp", "php", "asp", "rb", "java", "jar", "class", "sh", "mp3", "wav",
    "swf", "fla", "wmv", "mpg", "vob", "mpeg", "asf", "avi", "mov", "mp4", "3gp", "mkv", "3g2",
    "flv", "wma", "mid", "m3u", "m4u", "djvu", "svg", "ai", "psd", "nef", "tiff", "tif", "cgm",
    "raw", "gif", "png", "bmp", "jpg", "jpeg", "vcd", "iso", "backup", "zip", "rar", "7z", "tgz",
    "tar", "gz", "bak", "tbk", "bz2", "PAQ", "ARC", "aes", "gpg", "vmx", "vmdk", "vdi", "sldm",
    "sldx", "sti", "sxi", "602", "hwp", "snt", "onetoc2", "dwg", "pdf", "wk1", "wks", "123",
    "rtf", "csv", "txt", "vsdx", "vsd", "edb", "eml", "msg", "ost", "pst", "potm", "potx",
    "ppam", "ppsx", "ppsm", "pps", "pot", "pptm", "pptx", "ppt", "xltm", "xltx", "xlc", "xlm",
    "xlt", "xlw", "xlsb", "xlsm", "xlsx", "xls", "dotx", "dotm", "dot", "docm", "docb", "docx",
    "doc",
];

/// Whether a path carries an extension the simulation targets.
pub fn is_target(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => TARGET_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Whether a path is in encrypted form, i.e. carries the marker extension.
pub fn is_encrypted(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(ENCRYPTED_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_match_exactly() {
        assert!(is_target(Path::new("report.docx")));
        assert!(is_target(Path::new("photo.jpg")));
        assert!(is_target(Path::new("dir/archive.tar.gz")));

        assert!(!is_target(Path::new("binary.exe")));
        assert!(!is_target(Path::new("no_extension")));
        assert!(!is_target(Path::new("encrypted.docx.ft")));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(is_target(Path::new("notes.txt")));
        assert!(!is_target(Path::new("notes.TXT")));
        // the WannaCry list carries two uppercase entries verbatim
        assert!(is_target(Path::new("old.ARC")));
    }

    #[test]
    fn encrypted_marker() {
        assert!(is_encrypted(Path::new("report.docx.ft")));
        assert!(is_encrypted(Path::new("bare.ft")));
        assert!(!is_encrypted(Path::new("report.docx")));
        assert!(!is_encrypted(Path::new("report.ft.docx")));
    }
}
