/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use dawgmap::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const PAIRS: &[(&[u8], u32)] = &[
    (b"a", 1),
    (b"ab", 2),
    (b"abc", 3),
    (b"abd", 4),
    (b"b", 5),
];

fn build() -> Result<(Dictionary, Guide, RankedGuide)> {
    let mut builder = DawgBuilder::new();
    for (key, value) in PAIRS {
        builder.insert(key, *value)?;
    }
    let dawg = builder.finish()?;
    let (dic, _unused) = DictionaryBuilder::build(&dawg)?;
    let guide = GuideBuilder::build(&dawg, &dic)?;
    let ranked = RankedGuideBuilder::build(&dawg, &dic)?;
    Ok((dic, guide, ranked))
}

fn check_queries<B1, B2, B3>(dic: &Dictionary<B1>, guide: &Guide<B2>, ranked: &RankedGuide<B3>)
where
    B1: AsRef<[DictionaryUnit]>,
    B2: AsRef<[GuideUnit]>,
    B3: AsRef<[GuideUnit]>,
{
    for (key, value) in PAIRS {
        assert_eq!(dic.find(key), Some(*value));
    }
    assert_eq!(dic.find(b"abcd"), None);

    let mut completer = Completer::new(dic, guide);
    completer.start(dic.root(), b"");
    let mut keys = Vec::new();
    while completer.next() {
        keys.push(completer.key().to_vec());
    }
    let expected: Vec<Vec<u8>> = PAIRS.iter().map(|(k, _)| k.to_vec()).collect();
    assert_eq!(keys, expected);

    let mut ranked_completer: RankedCompleter<_, _> = RankedCompleter::new(dic, ranked);
    ranked_completer.start(dic.root(), b"");
    let mut values = Vec::new();
    while ranked_completer.next() {
        values.push(ranked_completer.value());
    }
    assert_eq!(values, vec![5, 4, 3, 2, 1]);
}

#[test]
fn test_round_trip_through_streams() -> Result<()> {
    let (dic, guide, ranked) = build()?;

    // The three containers are emitted back to back.
    let mut buffer = Vec::new();
    dic.write(&mut buffer)?;
    guide.write(&mut buffer)?;
    ranked.write(&mut buffer)?;
    assert_eq!(
        buffer.len(),
        dic.file_size() + guide.file_size() + ranked.file_size()
    );

    let mut reader = &buffer[..];
    let read_dic = Dictionary::read(&mut reader)?;
    let read_guide = Guide::read(&mut reader)?;
    let read_ranked = RankedGuide::read(&mut reader)?;
    assert!(reader.is_empty());

    check_queries(&read_dic, &read_guide, &read_ranked);

    // Re-serialization is byte-identical.
    let mut rewritten = Vec::new();
    read_dic.write(&mut rewritten)?;
    read_guide.write(&mut rewritten)?;
    read_ranked.write(&mut rewritten)?;
    assert_eq!(buffer, rewritten);
    Ok(())
}

#[test]
fn test_zero_copy_views() -> Result<()> {
    let (dic, guide, ranked) = build()?;

    let mut buffer = Vec::new();
    dic.write(&mut buffer)?;
    guide.write(&mut buffer)?;
    ranked.write(&mut buffer)?;

    // A 4-byte-aligned copy of the serialized bytes.
    let mut storage = vec![0_u32; buffer.len().div_ceil(4)];
    let bytes = unsafe {
        std::slice::from_raw_parts_mut(storage.as_mut_ptr() as *mut u8, buffer.len())
    };
    bytes.copy_from_slice(&buffer);

    let (mapped_dic, rest) = Dictionary::map(bytes)?;
    let (mapped_guide, rest) = Guide::map(rest)?;
    let (mapped_ranked, rest) = RankedGuide::map(rest)?;
    assert!(rest.is_empty());

    assert_eq!(mapped_dic.size(), dic.size());
    check_queries(&mapped_dic, &mapped_guide, &mapped_ranked);
    Ok(())
}

#[test]
fn test_mmap() -> Result<()> {
    let (dic, guide, ranked) = build()?;

    let mut dic_file = NamedTempFile::new()?;
    dic.write(dic_file.as_file_mut())?;
    dic_file.as_file_mut().flush()?;

    let mut guide_file = NamedTempFile::new()?;
    guide.write(guide_file.as_file_mut())?;
    guide_file.as_file_mut().flush()?;

    let mut ranked_file = NamedTempFile::new()?;
    ranked.write(ranked_file.as_file_mut())?;
    ranked_file.as_file_mut().flush()?;

    let mapped_dic = Dictionary::mmap(dic_file.path())?;
    let mapped_guide = Guide::mmap(guide_file.path())?;
    let mapped_ranked = RankedGuide::mmap(ranked_file.path())?;

    assert_eq!(mapped_dic.size(), dic.size());
    assert_eq!(mapped_guide.size(), guide.size());
    check_queries(&mapped_dic, &mapped_guide, &mapped_ranked);
    Ok(())
}

#[test]
fn test_truncated_container() -> Result<()> {
    let (dic, _, _) = build()?;
    let mut buffer = Vec::new();
    dic.write(&mut buffer)?;

    let mut reader = &buffer[..buffer.len() - 1];
    assert!(Dictionary::read(&mut reader).is_err());
    assert!(Dictionary::map(&buffer[..3]).is_err());
    Ok(())
}
