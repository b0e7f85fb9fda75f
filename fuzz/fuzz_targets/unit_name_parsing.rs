#![no_main]
use libfuzzer_sys::fuzz_target;
use unit_loader::{ResourcePath, UnitName};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    // Accepted names map to a slash path with no empty segments
    if let Ok(name) = UnitName::new(input) {
        let entry = name.entry_path("class");
        assert!(entry.ends_with(".class"));
        assert!(!entry.starts_with('/'));
        assert!(!entry.contains("//"));
        assert_eq!(input.parse::<UnitName>().ok(), Some(name));
    }

    let path = ResourcePath::new(input);
    assert!(path.as_str().len() + 1 >= input.len());
});
