use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tn3270r::lib3270::codes::*;
use tn3270r::lib3270::display::addressing::encode_12bit_address;
use tn3270r::lib3270::screen::encode_aid_request;
use tn3270r::lib3270::{AidKey, Display3270, ProtocolProcessor3270};

/// Erase/Write filling all 24 rows: a protected label and an input field
/// per row, with text in both
fn full_screen_record() -> Vec<u8> {
    let mut data = vec![CMD_ERASE_WRITE, WCC_KEYBOARD_RESTORE];
    for row in 0..24u16 {
        let (b1, b2) = encode_12bit_address(row * 80);
        data.extend([ORDER_SBA, b1, b2, ORDER_SF, ATTR_PROTECTED]);
        data.extend([0xD3, 0xC1, 0xC2, 0xC5, 0xD3, 0x7A]); // "LABEL:"
        data.extend([ORDER_SF, ATTR_MDT]);
        data.extend(std::iter::repeat(0xE7).take(60));
    }
    let (b1, b2) = encode_12bit_address(81);
    data.extend([ORDER_SBA, b1, b2, ORDER_IC]);
    data
}

fn bench_process_record(c: &mut Criterion) {
    let processor = ProtocolProcessor3270::new();
    let data = full_screen_record();

    c.bench_function("process_full_screen", |b| {
        b.iter(|| {
            let mut display = Display3270::new();
            processor
                .process_record(black_box(&data), black_box(&mut display))
                .unwrap();
        })
    });
}

fn bench_encode_aid_request(c: &mut Criterion) {
    let mut display = Display3270::new();
    ProtocolProcessor3270::new()
        .process_record(&full_screen_record(), &mut display)
        .unwrap();

    c.bench_function("encode_enter_request", |b| {
        b.iter(|| black_box(encode_aid_request(black_box(&display), AidKey::Enter)))
    });
}

criterion_group!(benches, bench_process_record, bench_encode_aid_request);
criterion_main!(benches);
