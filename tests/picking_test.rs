use lab_ngin::pick::{cursor_pixel, decode_id, encode_id, id_at, id_to_colour, padded_bytes_per_row, pixel_offset};

#[test]
fn ids_survive_the_colour_encoding() {
    for id in [0, 1, 70, 255, 256, 65_535, 0x00AB_CDEF, u32::MAX] {
        assert_eq!(decode_id(encode_id(id)), id);
        let unorm = id_to_colour(id).map(|c| (c * 255.0).round() as u8);
        assert_eq!(decode_id(unorm), id);
    }
    assert_eq!(encode_id(0x0403_0201), [1, 2, 3, 4]);
}

#[test]
fn rows_are_padded_to_the_copy_alignment() {
    assert_eq!(padded_bytes_per_row(1), 256);
    assert_eq!(padded_bytes_per_row(64), 256);
    assert_eq!(padded_bytes_per_row(65), 512);
    assert_eq!(padded_bytes_per_row(800), 3200);
}

#[test]
fn pixels_outside_the_target_have_no_offset() {
    assert_eq!(pixel_offset(2, 1, 3, 2, 256), Some(264));
    assert_eq!(pixel_offset(3, 0, 3, 2, 256), None);
    assert_eq!(pixel_offset(0, 2, 3, 2, 256), None);
}

#[test]
fn cursor_positions_map_onto_pixels() {
    assert_eq!(cursor_pixel(10.7, 3.2), Some((10, 3)));
    assert_eq!(cursor_pixel(-0.5, 3.0), None);
    assert_eq!(cursor_pixel(f64::NAN, 3.0), None);
}

#[test]
fn id_is_read_from_a_padded_readback() {
    let (width, height) = (3, 2);
    let bpr = padded_bytes_per_row(width) as usize;
    let mut data = vec![0u8; bpr * height as usize];
    data[bpr + 8..bpr + 12].copy_from_slice(&encode_id(77));

    assert_eq!(id_at(&data, 2, 1, width, height), Some(77));
    assert_eq!(id_at(&data, 0, 0, width, height), Some(0));
    assert_eq!(id_at(&data, 5, 0, width, height), None);
    assert_eq!(id_at(&data[..bpr], 2, 1, width, height), None);
}
