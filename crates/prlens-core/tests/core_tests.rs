use prlens_core::{chunk_text, ChunkingConfig, Error, Settings};

#[test]
fn single_small_text_becomes_one_chunk() {
    let chunks = chunk_text("Short text\n", 500, 50).expect("chunk");
    assert_eq!(chunks.len(), 1, "one small text becomes one chunk");
    assert_eq!(chunks[0].trim(), "Short text");
}

#[test]
fn long_text_uses_configured_window() {
    let text = "alpha ".repeat(1_050);
    let config = ChunkingConfig::new(500, 50).expect("config");
    let chunks = config.chunk(&text);
    // starts at 0, 450, 900
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].split(' ').count(), 500);
    assert_eq!(chunks[2].split(' ').count(), 150);
}

#[test]
fn settings_hand_out_validated_chunking() {
    let mut settings = Settings::default();
    settings.chunking.size = 8;
    settings.chunking.overlap = 3;
    let config = settings.chunking().expect("valid");
    assert_eq!(config.step(), 5);

    settings.chunking.overlap = 12;
    assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));
}
