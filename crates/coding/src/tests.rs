use super::*;

#[test]
fn varint_roundtrip_boundary_values() {
    // One value per encoded-length boundary, plus both type maxima.
    let values: &[u64] = &[
        0,
        1,
        127,
        128,
        16383,
        16384,
        u64::from(u32::MAX),
        u64::MAX,
    ];

    for &v in values {
        let mut buf = Vec::new();
        encode_varint64(&mut buf, v);
        assert_eq!(buf.len(), varint_length(v), "length mismatch for {}", v);

        let mut input = buf.as_slice();
        assert_eq!(get_varint64(&mut input), Some(v));
        assert!(input.is_empty(), "decoder must consume exactly {} bytes", buf.len());
    }
}

#[test]
fn varint32_roundtrip() {
    for &v in &[0u32, 1, 127, 128, 16383, 16384, u32::MAX] {
        let mut buf = Vec::new();
        encode_varint32(&mut buf, v);
        assert_eq!(buf.len(), varint_length(u64::from(v)));

        let mut input = buf.as_slice();
        assert_eq!(get_varint32(&mut input), Some(v));
        assert!(input.is_empty());
    }
}

#[test]
fn varint32_dense_range_roundtrip() {
    let mut buf = Vec::new();
    for i in 0..(32 * 32) {
        let v = (i / 32) << (i % 32);
        encode_varint32(&mut buf, v);
    }

    let mut input = buf.as_slice();
    for i in 0..(32 * 32) {
        let expected = (i / 32) << (i % 32);
        assert_eq!(get_varint32(&mut input), Some(expected));
    }
    assert!(input.is_empty());
}

#[test]
fn truncated_varint_is_rejected() {
    // A continuation bit with nothing after it.
    let mut input: &[u8] = &[0x80];
    assert_eq!(get_varint32(&mut input), None);

    let mut buf = Vec::new();
    encode_varint64(&mut buf, u64::MAX);
    let mut short = &buf[..buf.len() - 1];
    assert_eq!(get_varint64(&mut short), None);
}

#[test]
fn overlong_varint32_is_rejected() {
    // Six continuation bytes cannot fit in 32 bits.
    let mut input: &[u8] = &[0x81, 0x82, 0x83, 0x84, 0x85, 0x01];
    assert_eq!(get_varint32(&mut input), None);
}

#[test]
fn fixed_roundtrip() {
    let mut buf = Vec::new();
    put_fixed32(&mut buf, 0xdead_beef);
    put_fixed64(&mut buf, 0xdb47_7524_8b80_fb57);

    assert_eq!(decode_fixed32(&buf[..4]), 0xdead_beef);
    assert_eq!(decode_fixed64(&buf[4..]), 0xdb47_7524_8b80_fb57);
    // Little-endian byte order on the wire.
    assert_eq!(&buf[..4], &[0xef, 0xbe, 0xad, 0xde]);
}

#[test]
fn length_prefixed_slice_roundtrip() {
    let mut buf = Vec::new();
    put_length_prefixed_slice(&mut buf, b"");
    put_length_prefixed_slice(&mut buf, b"foo");
    put_length_prefixed_slice(&mut buf, &vec![b'x'; 300]);

    let mut input = buf.as_slice();
    assert_eq!(get_length_prefixed_slice(&mut input), Some(&b""[..]));
    assert_eq!(get_length_prefixed_slice(&mut input), Some(&b"foo"[..]));
    assert_eq!(
        get_length_prefixed_slice(&mut input).map(<[u8]>::len),
        Some(300)
    );
    assert!(input.is_empty());
}

#[test]
fn length_prefix_overrunning_buffer_is_rejected() {
    let mut buf = Vec::new();
    encode_varint32(&mut buf, 10);
    buf.extend_from_slice(b"short");

    let mut input = buf.as_slice();
    assert_eq!(get_length_prefixed_slice(&mut input), None);
}
