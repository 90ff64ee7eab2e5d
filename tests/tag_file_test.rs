use flashlight::resources::tags::{TagBlock, TagError, TagFile, object_data};

use crate::common::test_utils::INTERFACE;

mod common;

#[test]
fn block_values_skip_comments_and_tabs() {
    let block = object_data(INTERFACE, "MenuBackground").unwrap();
    assert_eq!(block.name(), "MenuBackground");
    assert_eq!(block.get("tag").unwrap(), "menu");
    assert_eq!(block.get("sprite").unwrap(), "textures/menu_background.png");
    assert_eq!(block.len(), 2);
}

#[test]
fn first_value_of_a_repeated_key_wins() {
    let block = object_data(INTERFACE, "MenuPlay").unwrap();
    assert_eq!(block.get("tag").unwrap(), "Play");
    assert_eq!(block.get_f32("transform.x").unwrap(), 540.0);
    assert_eq!(block.parse::<u32>("height").unwrap(), 60);
    let keys: Vec<_> = block.entries().map(|(key, _)| key).collect();
    assert_eq!(
        keys,
        vec!["tag", "sprite", "transform.x", "transform.y", "width", "height", "action"]
    );
}

#[test]
fn missing_block_is_reported() {
    match object_data(INTERFACE, "Nowhere") {
        Err(TagError::BlockNotFound { name }) => assert_eq!(name, "Nowhere"),
        other => panic!("expected BlockNotFound, got {:?}", other),
    }
}

#[test]
fn blocks_after_the_end_of_file_marker_are_not_found() {
    assert!(matches!(
        object_data(INTERFACE, "PastEndOfFile"),
        Err(TagError::BlockNotFound { .. })
    ));
}

#[test]
fn block_without_end_marker_stops_at_the_next_header() {
    let block = object_data(INTERFACE, "Unterminated").unwrap();
    assert_eq!(block.get("sprite").unwrap(), "textures/lonely.png");
    assert_eq!(block.len(), 1);

    let after = object_data(INTERFACE, "AfterUnterminated").unwrap();
    assert_eq!(after.get("sprite").unwrap(), "textures/after.png");
}

#[test]
fn block_without_end_marker_stops_at_the_end_of_input() {
    let block = object_data("TYPE >> Last\nkey:value", "Last").unwrap();
    assert_eq!(block.get("key").unwrap(), "value");
}

#[test]
fn windows_line_endings_are_accepted() {
    let text = "TYPE >> Crlf\r\nwidth:\t12\r\n----------END----------\r\n";
    let block = object_data(text, "Crlf").unwrap();
    assert_eq!(block.get_f32("width").unwrap(), 12.0);
}

#[test]
fn header_names_must_match_exactly() {
    let text = "TYPE >> MenuPlayer\nkey:a\n----------END----------\nTYPE >> MenuPlay\nkey:b\n----------END----------\n";
    assert_eq!(object_data(text, "MenuPlay").unwrap().get("key").unwrap(), "b");
}

#[test]
fn typed_getters_report_missing_and_invalid_values() {
    let mut block = TagBlock::new("Widget");
    assert!(block.insert("width", "wide"));
    assert!(block.insert("visible", "On"));
    assert!(!block.insert("width", "12"));

    assert!(matches!(
        block.get_f32("width"),
        Err(TagError::InvalidValue { ref key, .. }) if key == "width"
    ));
    assert!(matches!(
        block.get("height"),
        Err(TagError::MissingKey { ref key, .. }) if key == "height"
    ));
    assert_eq!(block.get_f32_or("height", 7.5).unwrap(), 7.5);
    assert!(block.get_f32_or("width", 7.5).is_err());
    assert!(block.get_bool("visible").unwrap());
}

#[test]
fn errors_describe_what_went_wrong() {
    let error = object_data(INTERFACE, "Nowhere").unwrap_err();
    assert_eq!(error.to_string(), "object not found in file: Nowhere");

    let wrapped: anyhow::Error = TagBlock::new("Terrain").get("heightmap").unwrap_err().into();
    assert!(wrapped.to_string().contains("heightmap"));
}

#[test]
fn files_are_read_from_disk() {
    let path = std::env::temp_dir().join(format!("flashlight-tags-{}.config", std::process::id()));
    std::fs::write(&path, INTERFACE).unwrap();

    let file = TagFile::open(&path).unwrap();
    assert_eq!(file.path(), path.as_path());
    assert_eq!(
        file.block_names(),
        vec!["MenuBackground", "MenuPlay", "Unterminated", "AfterUnterminated"]
    );
    assert_eq!(file.block("MenuPlay").unwrap().get("action").unwrap(), "play");

    std::fs::remove_file(&path).unwrap();
    assert!(matches!(TagFile::open(&path), Err(TagError::Io { .. })));
}

#[test]
fn in_memory_files_behave_like_opened_ones() {
    let file = TagFile::from_text("inline.config", INTERFACE);
    assert_eq!(file.block("MenuBackground").unwrap().get("tag").unwrap(), "menu");
}
