mod common;

use common::{encode_stream, MirrorEncoder};
use proptest::collection::vec;
use proptest::prelude::*;
use tablog::{DecodeError, Row, TablogDecoder};

fn decode_all(data: &[u8]) -> Vec<Row> {
    TablogDecoder::from_slice(data)
        .expect("decoder open failed")
        .map(|r| r.expect("row decode failed"))
        .collect()
}

proptest! {
    #[test]
    fn roundtrip_u8_column(values in vec(any::<u8>(), 0..200)) {
        let rows: Vec<Vec<i128>> = values.iter().map(|&v| vec![v as i128]).collect();
        let data = encode_stream(&["u8"], &rows);
        prop_assert_eq!(decode_all(&data), rows);
    }

    #[test]
    fn roundtrip_s64_column(values in vec(any::<i64>(), 0..100)) {
        let rows: Vec<Vec<i128>> = values.iter().map(|&v| vec![v as i128]).collect();
        let data = encode_stream(&["s64"], &rows);
        prop_assert_eq!(decode_all(&data), rows);
    }

    #[test]
    fn roundtrip_mixed_columns(pairs in vec((any::<i16>(), any::<u32>()), 0..100)) {
        let rows: Vec<Vec<i128>> = pairs
            .iter()
            .map(|&(a, b)| vec![a as i128, b as i128])
            .collect();
        let data = encode_stream(&["s16", "u32"], &rows);
        prop_assert_eq!(decode_all(&data), rows);
    }

    #[test]
    fn chunking_never_changes_rows(
        values in vec(any::<u16>(), 1..100),
        chunk in 1usize..16,
    ) {
        let rows: Vec<Vec<i128>> = values.iter().map(|&v| vec![v as i128]).collect();
        let data = encode_stream(&["u16"], &rows);
        let chunks: Vec<&[u8]> = data.chunks(chunk).collect();
        let decoded: Vec<Row> = TablogDecoder::new(chunks)
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        prop_assert_eq!(decoded, rows);
    }

    #[test]
    fn junk_prefix_is_counted_and_skipped(
        junk in vec(any::<u8>().prop_filter("not the escape byte", |&b| b != 0x54), 1..20),
        values in vec(any::<u8>(), 1..20),
    ) {
        let rows: Vec<Vec<i128>> = values.iter().map(|&v| vec![v as i128]).collect();
        let mut data = junk.clone();
        data.extend(encode_stream(&["u8"], &rows));

        let mut decoder = TablogDecoder::from_slice(&data).unwrap();
        prop_assert_eq!(
            decoder.next(),
            Some(Err(DecodeError::UnexpectedCharacters(junk.len())))
        );
        let decoded: Vec<Row> = decoder.map(|r| r.unwrap()).collect();
        prop_assert_eq!(decoded, rows);
    }

    #[test]
    fn multi_block_split_never_changes_rows(
        values in vec(any::<i32>(), 2..60),
        split in 1usize..59,
    ) {
        let rows: Vec<Vec<i128>> = values.iter().map(|&v| vec![v as i128]).collect();
        let split = split.min(rows.len() - 1);

        let mut enc = MirrorEncoder::new(vec![common::field("s32")]);
        let mut data = enc.encode_block(&rows[..split]);
        data.extend(enc.encode_block(&rows[split..]));

        prop_assert_eq!(decode_all(&data), rows);
    }
}
