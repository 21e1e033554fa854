#![allow(missing_docs)]
//! Host-level tests for the panel address mapper.

use std::collections::HashSet;

use pixel_link::Error;
use pixel_link::color::{RGB8, Rgb888, ToRgb8, ToRgb888};
use pixel_link::panel::layout::{LedLayout, PANEL_LAYOUT, to_physical, to_visual};
use pixel_link::panel::{CellId, PanelFrame, WireFrame};

#[test]
fn visual_round_trips_through_physical() {
    for row in 0..8 {
        for col in 0..8 {
            let cell = to_physical(row, col).expect("on the panel");
            assert_eq!(to_visual(cell), (row, col));
        }
    }
}

#[test]
fn every_wire_index_has_exactly_one_position() {
    let mut seen = HashSet::new();
    for row in 0..8 {
        for col in 0..8 {
            let cell = to_physical(row, col).expect("on the panel");
            assert!(seen.insert(cell.index()), "wire index {} hit twice", cell.index());
        }
    }
    assert_eq!(seen.len(), 64);
    assert!(seen.iter().all(|&index| index < 64));

    for cell in CellId::all() {
        let (row, col) = to_visual(cell);
        assert_eq!(to_physical(row, col), Ok(cell));
    }
}

#[test]
fn corners_follow_the_snake() {
    let wire = |row, col| to_physical(row, col).expect("on the panel").index();
    assert_eq!(wire(0, 0), 7);
    assert_eq!(wire(0, 7), 0);
    assert_eq!(wire(1, 0), 8);
    assert_eq!(wire(7, 0), 56);
    assert_eq!(wire(7, 7), 63);
}

#[test]
fn off_panel_positions_are_rejected() {
    assert_eq!(
        to_physical(0, 8),
        Err(Error::PositionOutOfRange { row: 0, col: 8 })
    );
    assert_eq!(CellId::new(64), Err(Error::CellOutOfRange(64)));
}

#[test]
fn panel_layout_is_flipped_serpentine() {
    const EXPECTED: LedLayout<64, 8, 8> = LedLayout::serpentine_row_major().flip_h();
    assert!(PANEL_LAYOUT.equals(&EXPECTED));
    assert_eq!(PANEL_LAYOUT.index_to_xy()[0], (7, 0));
    assert_eq!(PANEL_LAYOUT.index_to_xy()[8], (0, 1));
}

#[test]
fn small_serpentine_matches_expected() {
    const MAP: LedLayout<6, 3, 2> = LedLayout::serpentine_row_major();
    assert_eq!(
        *MAP.index_to_xy(),
        [(0, 0), (1, 0), (2, 0), (2, 1), (1, 1), (0, 1)]
    );
    assert_eq!(MAP.xy_to_index(), [0, 1, 2, 5, 4, 3]);
}

#[test]
fn wire_and_panel_frames_agree_cell_by_cell() {
    let mut wire = WireFrame::new();
    for cell in CellId::all() {
        wire.set_cell(cell, RGB8::new(cell.get(), 0, 0));
    }
    let panel = PanelFrame::from_wire(&wire);
    for cell in CellId::all() {
        let (row, col) = to_visual(cell);
        assert_eq!(panel[(usize::from(col), usize::from(row))], wire.cell(cell));
    }
    assert_eq!(WireFrame::from_panel(&panel), wire);
}

#[test]
fn rgb888_and_rgb8_convert_both_ways() {
    let rgb8 = RGB8::new(16, 32, 48);
    let rgb888 = Rgb888::new(16, 32, 48);
    assert_eq!(rgb888.to_rgb8(), rgb8);
    assert_eq!(rgb8.to_rgb888(), rgb888);
}
