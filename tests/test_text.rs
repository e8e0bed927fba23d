//! Tests for `swipekey::text` cursor index helpers.
use swipekey::text::{back_index, backspace_allowance, front_index, utf16_len};

#[test]
fn test_utf16_len() {
    assert_eq!(utf16_len(""), 0);
    assert_eq!(utf16_len("hello"), 5);
    assert_eq!(utf16_len("a😀"), 3);
    assert_eq!(utf16_len("ä"), 1);
}

#[test]
fn test_back_index() {
    assert_eq!(back_index(5, 0), 0);
    assert_eq!(back_index(5, 3), 2);
    assert_eq!(back_index(5, 5), 4);
    assert_eq!(back_index(5, -10), 0);
    assert_eq!(back_index(5, 99), 4);
    assert_eq!(back_index(0, 0), 0);
}

#[test]
fn test_front_index() {
    assert_eq!(front_index(5, 0), 1);
    assert_eq!(front_index(5, 3), 4);
    assert_eq!(front_index(5, 5), 5);
    assert_eq!(front_index(5, -3), 1);
    assert_eq!(front_index(5, i64::MAX), 5);
    assert_eq!(front_index(0, 0), 0);
}

#[test]
fn test_backspace_allowance() {
    assert_eq!(backspace_allowance(5, 3), 3);
    assert_eq!(backspace_allowance(5, -1), 0);
    assert_eq!(backspace_allowance(5, 8), 5);
}

#[test]
fn test_indices_stay_in_bounds() {
    for len in 0..6usize {
        for index in -3..10i64 {
            assert!(back_index(len, index) <= len);
            assert!(front_index(len, index) <= len);
            assert!(backspace_allowance(len, index) <= len);
        }
    }
}

#[test]
fn test_with_utf16_lengths() {
    let text = "a😀b";
    let len = utf16_len(text);
    assert_eq!(len, 4);
    assert_eq!(back_index(len, len as i64), 3);
    assert_eq!(front_index(len, len as i64), len);
}
