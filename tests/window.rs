//! Frame window and test pattern tests.

use ffmpeg_next::format::Pixel;
use framepipe::{FrameWindow, test_pattern};

#[test]
fn empty_window() {
    let window = FrameWindow::new();
    assert!(window.is_empty());
    assert_eq!(window.len(), 0);
}

#[test]
fn push_preserves_order() {
    let mut window = FrameWindow::with_capacity(3);
    for index in 0..3 {
        window.push(test_pattern(64, 48, index));
    }

    assert_eq!(window.len(), 3);
    assert!(!window.is_empty());

    // The luma plane encodes the frame index, so order is observable.
    for (index, frame) in window.frames().iter().enumerate() {
        assert_eq!(frame.data(0)[0], (index * 3) as u8);
    }
}

#[test]
fn into_iterator_yields_all_frames() {
    let window: FrameWindow = (0..5).map(|index| test_pattern(64, 48, index)).collect();
    assert_eq!(window.into_iter().count(), 5);
}

#[test]
fn test_pattern_geometry() {
    let frame = test_pattern(320, 240, 0);
    assert_eq!(frame.width(), 320);
    assert_eq!(frame.height(), 240);
    assert_eq!(frame.format(), Pixel::YUV420P);
    assert_eq!(frame.planes(), 3);
}

#[test]
fn test_pattern_is_deterministic() {
    let a = test_pattern(64, 48, 7);
    let b = test_pattern(64, 48, 7);
    assert_eq!(a.data(0), b.data(0));
    assert_eq!(a.data(1), b.data(1));
    assert_eq!(a.data(2), b.data(2));
}

#[test]
fn test_pattern_animates() {
    let a = test_pattern(64, 48, 0);
    let b = test_pattern(64, 48, 1);
    assert_ne!(a.data(0)[0], b.data(0)[0]);
}
