//! Parallel search equivalence and cooperative-stop behavior.
#![cfg(feature = "rayon")]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use pixelfind::{AlsoDecision, FinderOptions, Frame, ImageFinder, Pattern, Rect};

const WHITE: u32 = 0xffff_ffff;
const RED: u32 = 0xffff_0000;
const GREEN: u32 = 0xff00_ff00;
const BLUE: u32 = 0xff00_00ff;

/// 16x10 white frame: three 2x2 red blocks, one green pixel, no blue.
fn playground() -> Frame {
    let mut pixels = vec![WHITE; 16 * 10];
    for (bx, by) in [(1usize, 1usize), (6, 4), (12, 7)] {
        for dy in 0..2 {
            for dx in 0..2 {
                pixels[(by + dy) * 16 + bx + dx] = RED;
            }
        }
    }
    pixels[8 * 16 + 3] = GREEN;
    Frame::new(pixels, 16, 10).unwrap()
}

fn patterns() -> Vec<Pattern> {
    vec![
        Pattern::from_pixels(vec![RED; 4], 2, 2).unwrap(),
        Pattern::from_color(0x0000_ff00),
        Pattern::from_color(0x0000_00ff),
    ]
}

fn finder(parallel: bool) -> ImageFinder {
    ImageFinder::new(
        patterns(),
        FinderOptions {
            parallel,
            ..FinderOptions::default()
        },
    )
    .unwrap()
}

#[test]
fn parallel_matches_sequential_when_one_pattern_exists() {
    // only the blue pattern exists in this frame, so first-to-lock is
    // deterministic
    let mut pixels = vec![WHITE; 16 * 10];
    pixels[5 * 16 + 9] = BLUE;
    let frame = Frame::new(pixels, 16, 10).unwrap();

    let sequential = finder(false).find_in(&frame).unwrap();
    let parallel = finder(true).find_in(&frame).unwrap();
    assert_eq!(sequential, parallel);
    assert_eq!(parallel.rect, Rect { x: 9, y: 5, width: 1, height: 1 });
    assert_eq!(parallel.list_index, 2);
}

#[test]
fn parallel_enumeration_visits_every_occurrence() {
    let visited = Arc::new(Mutex::new(HashSet::<(usize, i32, i32)>::new()));
    let sink = Arc::clone(&visited);
    let found = finder(true)
        .with_callback(Box::new(move |m| {
            sink.lock()
                .unwrap()
                .insert((m.list_index, m.rect.x, m.rect.y));
            AlsoDecision::OkFindMore
        }))
        .find_in(&playground());

    assert!(found.is_some());
    let visited = visited.lock().unwrap();
    let expected: HashSet<(usize, i32, i32)> =
        [(0, 1, 1), (0, 6, 4), (0, 12, 7), (1, 3, 8)].into_iter().collect();
    assert_eq!(*visited, expected);
}

#[test]
fn of_this_keeps_enumerating_the_deciding_pattern() {
    let visited = Arc::new(Mutex::new(Vec::<(usize, usize)>::new()));
    let sink = Arc::clone(&visited);
    let found = finder(true)
        .with_callback(Box::new(move |m| {
            sink.lock().unwrap().push((m.list_index, m.match_index));
            if m.list_index == 0 {
                AlsoDecision::OkFindMoreOfThis
            } else {
                AlsoDecision::FindOther
            }
        }))
        .find_in(&playground());

    // the red task never stops itself, so all three occurrences are
    // visited in scan order regardless of what the other tasks did
    let visited = visited.lock().unwrap();
    let red: Vec<usize> = visited
        .iter()
        .filter(|(list, _)| *list == 0)
        .map(|(_, match_index)| *match_index)
        .collect();
    assert_eq!(red, vec![0, 1, 2]);

    // the last remembered red occurrence is the result
    let found = found.unwrap();
    assert_eq!(found.list_index, 0);
    assert_eq!(found.match_index, 2);
}

#[test]
fn parallel_no_callback_reports_an_existing_pattern() {
    let found = finder(true).find_in(&playground()).unwrap();
    // red or green wins the lock race; blue cannot
    assert!(found.list_index < 2);
}
