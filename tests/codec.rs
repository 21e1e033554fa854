#![allow(missing_docs)]
//! Host-level tests for command bytes, notification decoding, and the snapshot store.

mod common;

use common::{FakePanel, slot};
use pixel_link::Error;
use pixel_link::color::{RGB8, colors, parse_hex_color};
use pixel_link::command::{Command, decode_notification};
use pixel_link::panel::layout::to_physical;
use pixel_link::panel::{CellId, PanelFrame, WireFrame};
use pixel_link::snapshot::SnapshotStore;

fn encode(command: Command) -> Vec<u8> {
    command.encode().expect("command encodes").to_vec()
}

fn paint(id: u8, hex: &str) -> Command {
    Command::Paint {
        cell: CellId::new(id).expect("valid cell"),
        color: parse_hex_color(hex).expect("valid color"),
    }
}

#[test]
fn paint_bytes_are_decimal_id_comma_prefixed_hex() {
    assert_eq!(encode(paint(0, "#ff0000")), b"0,0xff0000");
    assert_eq!(encode(paint(63, "#00ff00")), b"63,0x00ff00");
    assert_eq!(encode(paint(5, "#ABCDEF")), b"5,0xabcdef");
    assert_eq!(encode(paint(63, "#ffffff")).len(), pixel_link::command::MAX_COMMAND_LEN);
}

#[test]
fn fixed_commands_match_the_wire_table() {
    assert_eq!(encode(Command::Clear), b"c0");
    assert_eq!(encode(Command::SaveSlot(slot(3))), b"w3");
    assert_eq!(encode(Command::LoadSlot(slot(1))), b"l1\0");
    assert_eq!(encode(Command::SelectSlot(slot(2))), b"s2\0");
}

#[test]
fn out_of_range_addresses_never_become_commands() {
    assert_eq!(CellId::new(64), Err(Error::CellOutOfRange(64)));
    assert_eq!(
        pixel_link::snapshot::SlotId::new(4),
        Err(Error::SlotOutOfRange(4))
    );
}

#[test]
fn wrong_length_frames_leave_the_slot_unchanged() {
    let mut store = SnapshotStore::new();
    let kept = PanelFrame::filled(colors::PURPLE);
    store.write(slot(1), kept);

    for len in [191, 193] {
        let bytes = vec![0x55; len];
        let error = decode_notification(&bytes).expect_err("frame length is wrong");
        assert_eq!(error, Error::FrameLength { len });
        assert_eq!(store.write_bytes(slot(1), &bytes), Err(error));
        assert_eq!(store.read(slot(1)), kept);
    }
}

#[test]
fn notification_triples_follow_wire_order() {
    let mut bytes = [0_u8; 192];
    // Wire index 7 is the top-left cell.
    bytes[21..24].copy_from_slice(&[0x12, 0x34, 0x56]);
    let wire = decode_notification(&bytes).expect("192 bytes");
    let panel = PanelFrame::from_wire(&wire);

    assert_eq!(panel[(0, 0)], RGB8::new(0x12, 0x34, 0x56));
    assert_eq!(panel.to_bytes()[..3], [0x12, 0x34, 0x56]);
    assert_eq!(wire.to_bytes(), bytes);
}

#[test]
fn clear_save_load_on_the_panel_yields_black() {
    let mut panel = FakePanel::default();
    panel.slots[2] = WireFrame::filled(colors::RED);
    for command in [paint(4, "#ffffff"), Command::Clear, Command::SaveSlot(slot(2))] {
        assert_eq!(panel.apply(&encode(command)), None);
    }
    let response = panel
        .apply(&encode(Command::LoadSlot(slot(2))))
        .expect("load answers with a frame");

    let mut store = SnapshotStore::new();
    store.write(slot(2), PanelFrame::filled(colors::RED));
    let frame = decode_notification(&response).expect("192 bytes");
    store.write(slot(2), PanelFrame::from_wire(&frame));
    assert_eq!(store.read_bytes(slot(2)), [0; 192]);
}

#[test]
fn painted_cell_survives_save_and_load_in_visual_position() {
    let mut panel = FakePanel::default();
    let cell = to_physical(2, 3).expect("on the panel");
    let teal = Command::Paint {
        cell,
        color: colors::TEAL,
    };
    panel.apply(&encode(teal));
    panel.apply(&encode(Command::SaveSlot(slot(0))));
    let response = panel
        .apply(&encode(Command::LoadSlot(slot(0))))
        .expect("load answers with a frame");

    let frame = PanelFrame::from_wire(&decode_notification(&response).expect("192 bytes"));
    assert_eq!(frame[(3, 2)], colors::TEAL);
    assert_eq!(frame.iter().flatten().filter(|&&color| color == colors::TEAL).count(), 1);
}
