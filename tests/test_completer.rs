/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use dawgmap::prelude::*;

fn build(pairs: &[(&[u8], u32)]) -> Result<(Dawg, Dictionary, Guide)> {
    let mut builder = DawgBuilder::new();
    for (key, value) in pairs {
        builder.insert(key, *value)?;
    }
    let dawg = builder.finish()?;
    let (dic, _unused) = DictionaryBuilder::build(&dawg)?;
    let guide = GuideBuilder::build(&dawg, &dic)?;
    Ok((dawg, dic, guide))
}

fn complete<B1: AsRef<[DictionaryUnit]>, B2: AsRef<[GuideUnit]>>(
    dic: &Dictionary<B1>,
    guide: &Guide<B2>,
    prefix: &[u8],
) -> Vec<(Vec<u8>, u32)> {
    let mut index = dic.root();
    if !dic.follow_bytes(prefix, &mut index) {
        return Vec::new();
    }
    let mut completer = Completer::new(dic, guide);
    completer.start(index, prefix);
    let mut results = Vec::new();
    while completer.next() {
        results.push((completer.key().to_vec(), completer.value()));
    }
    results
}

#[test]
fn test_enumeration_is_sorted_and_complete() -> Result<()> {
    let pairs: &[(&[u8], u32)] = &[
        (b"a", 1),
        (b"ab", 2),
        (b"abc", 3),
        (b"abd", 4),
        (b"b", 5),
    ];
    let (_, dic, guide) = build(pairs)?;

    let results = complete(&dic, &guide, b"");
    let expected: Vec<(Vec<u8>, u32)> =
        pairs.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
    assert_eq!(results, expected);
    Ok(())
}

#[test]
fn test_prefix_completion() -> Result<()> {
    let pairs: &[(&[u8], u32)] = &[
        (b"a", 1),
        (b"ab", 2),
        (b"abc", 3),
        (b"abd", 4),
        (b"b", 5),
        (b"bad", 6),
        (b"badge", 7),
        (b"bard", 8),
    ];
    let (_, dic, guide) = build(pairs)?;

    for prefix in [&b"a"[..], b"ab", b"b", b"ba", b"bad", b"badge", b"x"] {
        let results = complete(&dic, &guide, prefix);
        let expected: Vec<(Vec<u8>, u32)> = pairs
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.to_vec(), *v))
            .collect();
        assert_eq!(results, expected, "prefix {:?}", prefix);
    }
    Ok(())
}

#[test]
fn test_two_letter_cube() -> Result<()> {
    // All 3-letter words over {x, y}, valued by lexicographic rank.
    let mut pairs: Vec<(Vec<u8>, u32)> = Vec::new();
    for rank in 0..8_u32 {
        let key = vec![
            if rank & 4 != 0 { b'y' } else { b'x' },
            if rank & 2 != 0 { b'y' } else { b'x' },
            if rank & 1 != 0 { b'y' } else { b'x' },
        ];
        pairs.push((key, rank));
    }
    let pairs: Vec<(&[u8], u32)> = pairs.iter().map(|(k, v)| (&k[..], *v)).collect();
    let (_, dic, guide) = build(&pairs)?;

    let results = complete(&dic, &guide, b"");
    assert_eq!(results.len(), 8);
    for (rank, (key, value)) in results.iter().enumerate() {
        assert_eq!(*value, rank as u32);
        assert_eq!(dic.find(key), Some(rank as u32));
    }
    Ok(())
}

#[test]
fn test_suffix_merging() -> Result<()> {
    // With equal values the suffixes of the {x, y} cube merge into a
    // five-state automaton.
    let mut pairs: Vec<(Vec<u8>, u32)> = Vec::new();
    for rank in 0..8_u32 {
        let key = vec![
            if rank & 4 != 0 { b'y' } else { b'x' },
            if rank & 2 != 0 { b'y' } else { b'x' },
            if rank & 1 != 0 { b'y' } else { b'x' },
        ];
        pairs.push((key, 0));
    }
    let pairs: Vec<(&[u8], u32)> = pairs.iter().map(|(k, v)| (&k[..], *v)).collect();
    let (dawg, dic, guide) = build(&pairs)?;

    assert!(dawg.num_of_states() <= 5);
    assert!(dawg.num_of_merging_states() > 0);
    assert!(dawg.num_of_merged_transitions() > 0);
    assert_eq!(
        dawg.num_of_merged_states(),
        dawg.num_of_transitions() + dawg.num_of_merged_transitions() + 1 - dawg.num_of_states()
    );

    let results = complete(&dic, &guide, b"");
    assert_eq!(results.len(), 8);
    Ok(())
}

#[test]
fn test_shared_suffix_across_parents() -> Result<()> {
    // "nation"/"station" share the "ation" suffix; the merged subtree must
    // be enumerated under both parents.
    let pairs: &[(&[u8], u32)] = &[
        (b"nation", 1),
        (b"national", 2),
        (b"station", 1),
        (b"stational", 2),
    ];
    let (dawg, dic, guide) = build(pairs)?;
    assert!(dawg.num_of_merging_states() > 0);

    assert_eq!(
        complete(&dic, &guide, b"n"),
        vec![(b"nation".to_vec(), 1), (b"national".to_vec(), 2)]
    );
    assert_eq!(
        complete(&dic, &guide, b"s"),
        vec![(b"station".to_vec(), 1), (b"stational".to_vec(), 2)]
    );
    Ok(())
}
