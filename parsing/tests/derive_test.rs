#![allow(dead_code)]

use parsing::ReadBytes;

#[test]
fn test_magic_and_padding() {
    parsing::parsable_struct! {
        #[derive(Debug)]
        pub struct FrameHeader {
            frame_size: u32,
            [[magic: u16 = 0xF1FA]]
            chunks: u16,
            duration: u16,
            [[padding_bytes = 2]]
            new_chunks: u32,
        }
    }

    let mut bytes = [0_u8; 16];
    bytes[0] = 16;
    bytes[4..6].copy_from_slice(&[0xFA, 0xF1]);
    bytes[6] = 2;
    bytes[8] = 100;
    bytes[12] = 2;

    let mut b = bytes.as_slice();
    let h: FrameHeader = b.read_type_le().unwrap();
    assert_eq!(h.frame_size, 16);
    assert_eq!(h.chunks, 2);
    assert_eq!(h.duration, 100);
    assert_eq!(h.new_chunks, 2);
    assert!(b.is_empty());

    let mut b = bytes.as_slice();
    assert_eq!(
        b.read_type_be::<FrameHeader>().unwrap_err(),
        parsing::Error::MagicCheckFailed {
            expected: 0xF1FA,
            found: 0xFAF1
        }
    );

    let bytes = [0_u8; 16];
    let mut b = bytes.as_slice();
    assert_eq!(
        b.read_type_le::<FrameHeader>().unwrap_err(),
        parsing::Error::MagicCheckFailed {
            expected: 0xF1FA,
            found: 0
        }
    );
}

#[test]
fn test_borrowed_str() {
    parsing::parsable_struct! {
        #[derive(Debug)]
        pub struct Tag<'a> {
            from: u16,
            to: u16,
            [[padding_bytes = 4]]
            [[param: u16 = name_len]]
            #[parse(sized_utf8_string = name_len)]
            name: &'a str,
            repeat: u16,
        }
    }

    let mut bytes = vec![1_u8, 0, 3, 0, 0, 0, 0, 0, 4, 0];
    bytes.extend_from_slice(b"walk");
    bytes.extend_from_slice(&[2, 0]);

    let mut b = bytes.as_slice();
    let t: Tag = b.read_type_le().unwrap();
    assert_eq!((t.from, t.to), (1, 3));
    assert_eq!(t.name, "walk");
    assert_eq!(t.repeat, 2);
    assert!(b.is_empty());

    // a big endian length prefix runs past the buffer
    let mut b = bytes.as_slice();
    assert_eq!(
        b.read_type_be::<Tag>().unwrap_err(),
        parsing::Error::UnexpectedEndOfData {
            wanted: 1024,
            remaining: 6
        }
    );
}

#[test]
fn test_owned_string() {
    parsing::parsable_struct! {
        #[derive(Debug)]
        pub struct LayerName {
            [[param: u16 = len]]
            #[parse(sized_utf8_string = len)]
            name: String,
        }
    }

    let bytes = [5_u8, 0, b'H', b'a', b'n', b'd', b's'];
    let mut b = bytes.as_slice();
    let l: LayerName = b.read_type_le().unwrap();
    assert_eq!(l.name, "Hands");
    assert!(b.is_empty());
}

#[test]
fn test_invalid_utf8() {
    parsing::parsable_struct! {
        #[derive(Debug)]
        pub struct Name {
            [[param: u8 = len]]
            #[parse(sized_utf8_string = len)]
            value: String,
        }
    }

    let bytes = [2_u8, 0xC3, 0x28];
    let mut b = bytes.as_slice();
    assert!(matches!(
        b.read_type_le::<Name>(),
        Err(parsing::Error::InterpretStrFailed(_))
    ));
}

#[test]
fn test_sized_buf() {
    parsing::parsable_struct! {
        #[derive(Debug)]
        pub struct Embedded<'a> {
            [[param: u32 = len]]
            #[parse(sized_buf = len)]
            data: &'a [u8],
            trailer: u8,
        }
    }

    parsing::parsable_struct! {
        #[derive(Debug)]
        pub struct Owned {
            [[param: u8 = len]]
            #[parse(sized_buf = len)]
            data: Vec<u8>,
        }
    }

    let bytes = [3_u8, 0, 0, 0, 0x78, 0x9C, 0x01, 9];
    let mut b = bytes.as_slice();
    let e: Embedded = b.read_type_le().unwrap();
    assert_eq!(e.data, &[0x78, 0x9C, 0x01]);
    assert_eq!(e.trailer, 9);

    let bytes = [2_u8, 5, 6];
    let mut b = bytes.as_slice();
    let o: Owned = b.read_type_le().unwrap();
    assert_eq!(o.data, vec![5, 6]);
}

#[test]
fn test_collection() {
    parsing::parsable_struct! {
        #[derive(Debug)]
        pub struct Entry {
            rgba: [u8; 4],
        }
    }

    parsing::parsable_struct! {
        #[derive(Debug)]
        pub struct Palette {
            first: u32,
            last: u32,
            #[parse(collection: Entry = (last - first + 1))]
            entries: Vec<Entry>,
        }
    }

    parsing::parsable_struct! {
        #[derive(Debug)]
        pub struct Name<'a> {
            [[param: u16 = len]]
            #[parse(sized_utf8_string = len)]
            value: &'a str,
        }
    }

    parsing::parsable_struct! {
        #[derive(Debug)]
        pub struct Names<'a> {
            [[param: u8 = count]]
            #[parse(collection: Name = count)]
            names: Vec<Name<'a>>,
        }
    }

    let bytes = [
        1_u8, 0, 0, 0, 2, 0, 0, 0, //
        255, 0, 0, 255, //
        0, 255, 0, 255,
    ];
    let mut b = bytes.as_slice();
    let p: Palette = b.read_type_le().unwrap();
    assert_eq!(p.entries.len(), 2);
    assert_eq!(p.entries[1].rgba, [0, 255, 0, 255]);

    // items of different sizes
    let bytes = [2_u8, 2, 0, b'h', b'i', 3, 0, b'r', b'u', b'n'];
    let mut b = bytes.as_slice();
    let n: Names = b.read_type_le().unwrap();
    let names: Vec<&str> = n.names.iter().map(|name| name.value).collect();
    assert_eq!(names, vec!["hi", "run"]);
    assert!(b.is_empty());
}

#[test]
fn test_derive_with_option() {
    parsing::parsable_struct! {
        #[derive(Debug)]
        pub struct Layer {
            pub layer_type: u16,
            #[parse(option_if: u32 = layer_type == 2)]
            pub tileset_index: Option<u32>,
            #[parse(option_if: [u8; 2] = (layer_type & 1) != 0)]
            pub extra: Option<[u8; 2]>,
        }
    }

    let bytes = [2_u8, 0, 7, 0, 0, 0];
    let mut b = bytes.as_slice();
    let l: Layer = b.read_type_le().unwrap();
    assert_eq!(l.tileset_index, Some(7));
    assert_eq!(l.extra, None);
    assert!(b.is_empty());

    let bytes = [1_u8, 0, 9, 8];
    let mut b = bytes.as_slice();
    let l: Layer = b.read_type_le().unwrap();
    assert_eq!(l.tileset_index, None);
    assert_eq!(l.extra, Some([9, 8]));
}

#[test]
fn test_limit_buffer() {
    parsing::parsable_struct! {
        #[derive(Debug)]
        pub struct Sized<'a> {
            [[param: u8 = size]]
            [[limit_buffer = size]]
            pub value: u16,
            #[parse(rest_of_buf)]
            pub rest: &'a [u8],
        }
    }

    parsing::parsable_struct! {
        #[derive(Debug)]
        pub struct Strict {
            [[param: u8 = size]]
            [[limit_buffer = size]]
            pub value: u16,
        }
    }

    // size covers the u16 plus two trailing bytes, the last byte is outside
    let bytes = [4_u8, 1, 0, 0xAA, 0xBB, 0xCC];
    let mut b = bytes.as_slice();
    let s: Sized = b.read_type_le().unwrap();
    assert_eq!(s.value, 1);
    assert_eq!(s.rest, &[0xAA, 0xBB]);
    assert_eq!(b, &[0xCC]);

    let mut b = bytes.as_slice();
    assert_eq!(
        b.read_type_le::<Strict>().unwrap_err(),
        parsing::Error::UnconsumedBytes { remaining: 2 }
    );

    let bytes = [4_u8, 1, 0];
    let mut b = bytes.as_slice();
    assert_eq!(
        b.read_type_le::<Strict>().unwrap_err(),
        parsing::Error::UnexpectedEndOfData {
            wanted: 4,
            remaining: 2
        }
    );
}

#[test]
fn test_derive_macro() {
    #[derive(Debug, PartialEq, parsing::Parse)]
    struct Point {
        x: i32,
        y: i32,
    }

    let bytes = [0xFF_u8, 0xFF, 0xFF, 0xFF, 3, 0, 0, 0];
    let mut b = bytes.as_slice();
    let p: Point = b.read_type_le().unwrap();
    assert_eq!(p, Point { x: -1, y: 3 });
}

#[test]
fn test_enum() {
    parsing::parsable_enum! {
        #[derive(Debug, PartialEq)]
        #[repr(u16)]
        pub enum Chunk {
            [[param: u16 = chunk_type]]
            [[enum_type = chunk_type]]
            Opacity(u8) = 0x2004,
            Duration(u16) = 0x2005,
        }
    }

    let bytes = [0x05_u8, 0x20, 100, 0];
    let mut b = bytes.as_slice();
    assert_eq!(b.read_type_le::<Chunk>().unwrap(), Chunk::Duration(100));

    let mut b = bytes.as_slice();
    assert_eq!(
        b.read_type_be::<Chunk>().unwrap_err(),
        parsing::Error::EnumTypeValueMatchFailed(0x0520)
    );

    let bytes = [0x04_u8, 0x20, 7];
    let mut b = bytes.as_slice();
    assert_eq!(b.read_type_le::<Chunk>().unwrap(), Chunk::Opacity(7));

    let bytes = [0x99_u8, 0x99, 0, 0];
    let mut b = bytes.as_slice();
    assert_eq!(
        b.read_type_le::<Chunk>().unwrap_err(),
        parsing::Error::EnumTypeValueMatchFailed(0x9999)
    );
}

#[test]
fn test_enum_with_limited_buffer() {
    parsing::parsable_struct! {
        #[derive(Debug, PartialEq)]
        pub struct Body<'a> {
            #[parse(rest_of_buf)]
            pub bytes: &'a [u8],
        }
    }

    parsing::parsable_enum! {
        #[derive(Debug, PartialEq)]
        #[repr(u8)]
        pub enum Record<'a> {
            [[param: u8 = size]]
            [[limit_buffer = size]]
            [[param: u8 = kind]]
            [[enum_type = kind]]
            Short(u8) = 1,
            Raw(Body<'a>) = 2,
        }
    }

    let bytes = [3_u8, 2, 0xAB, 0xCD, 2, 1, 7];
    let mut b = bytes.as_slice();
    let first: Record = b.read_type_le().unwrap();
    assert_eq!(first, Record::Raw(Body { bytes: &[0xAB, 0xCD] }));
    let second: Record = b.read_type_le().unwrap();
    assert_eq!(second, Record::Short(7));
    assert!(b.is_empty());

    let bytes = [3_u8, 1, 7, 8];
    let mut b = bytes.as_slice();
    assert_eq!(
        b.read_type_le::<Record>().unwrap_err(),
        parsing::Error::UnconsumedBytes { remaining: 1 }
    );
}
