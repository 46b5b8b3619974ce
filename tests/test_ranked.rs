/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use dawgmap::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

fn build(pairs: &[(&[u8], u32)]) -> Result<(Dawg, Dictionary)> {
    let mut builder = DawgBuilder::new();
    for (key, value) in pairs {
        builder.insert(key, *value)?;
    }
    let dawg = builder.finish()?;
    let (dic, _unused) = DictionaryBuilder::build(&dawg)?;
    Ok((dawg, dic))
}

fn complete_ranked<O: ValueOrder>(
    dic: &Dictionary,
    guide: &RankedGuide,
    prefix: &[u8],
) -> Vec<(Vec<u8>, u32)> {
    let mut index = dic.root();
    if !dic.follow_bytes(prefix, &mut index) {
        return Vec::new();
    }
    let mut completer: RankedCompleter<_, _, O> = RankedCompleter::new(dic, guide);
    completer.start(index, prefix);
    let mut results = Vec::new();
    while completer.next() {
        results.push((completer.key().to_vec(), completer.value()));
    }
    results
}

#[test]
fn test_descending_values() -> Result<()> {
    let pairs: &[(&[u8], u32)] = &[
        (b"car", 20),
        (b"card", 30),
        (b"care", 40),
        (b"cart", 50),
        (b"cat", 10),
    ];
    let (dawg, dic) = build(pairs)?;
    let guide = RankedGuideBuilder::build(&dawg, &dic)?;

    let results = complete_ranked::<MaxValueFirst>(&dic, &guide, b"");
    let expected: Vec<(Vec<u8>, u32)> = vec![
        (b"cart".to_vec(), 50),
        (b"care".to_vec(), 40),
        (b"card".to_vec(), 30),
        (b"car".to_vec(), 20),
        (b"cat".to_vec(), 10),
    ];
    assert_eq!(results, expected);
    Ok(())
}

#[test]
fn test_ascending_values() -> Result<()> {
    let pairs: &[(&[u8], u32)] = &[
        (b"car", 20),
        (b"card", 30),
        (b"care", 40),
        (b"cart", 50),
        (b"cat", 10),
    ];
    let (dawg, dic) = build(pairs)?;
    let guide = RankedGuideBuilder::build_with_order::<MinValueFirst>(&dawg, &dic)?;

    let results = complete_ranked::<MinValueFirst>(&dic, &guide, b"");
    let values: Vec<u32> = results.iter().map(|(_, v)| *v).collect();
    assert_eq!(values, vec![10, 20, 30, 40, 50]);
    Ok(())
}

#[test]
fn test_ranked_prefix() -> Result<()> {
    let pairs: &[(&[u8], u32)] = &[
        (b"car", 20),
        (b"card", 30),
        (b"care", 40),
        (b"cart", 50),
        (b"cat", 10),
    ];
    let (dawg, dic) = build(pairs)?;
    let guide = RankedGuideBuilder::build(&dawg, &dic)?;

    let results = complete_ranked::<MaxValueFirst>(&dic, &guide, b"car");
    let expected: Vec<(Vec<u8>, u32)> = vec![
        (b"cart".to_vec(), 50),
        (b"care".to_vec(), 40),
        (b"card".to_vec(), 30),
        (b"car".to_vec(), 20),
    ];
    assert_eq!(results, expected);
    Ok(())
}

#[test]
fn test_random_corpus_order_and_determinism() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(0x5EED);
    let mut corpus = BTreeMap::new();
    while corpus.len() < 500 {
        let len = rng.random_range(1..=7);
        let key: Vec<u8> = (0..len).map(|_| rng.random_range(b'a'..=b'd')).collect();
        let value = rng.random_range(0..1000);
        corpus.entry(key).or_insert(value);
    }

    let pairs: Vec<(&[u8], u32)> = corpus.iter().map(|(k, v)| (&k[..], *v)).collect();
    let (dawg, dic) = build(&pairs)?;
    let guide = RankedGuideBuilder::build(&dawg, &dic)?;

    let results = complete_ranked::<MaxValueFirst>(&dic, &guide, b"");
    assert_eq!(results.len(), corpus.len());

    // Values arrive in non-increasing order and the multiset of pairs is
    // exactly the input.
    for window in results.windows(2) {
        assert!(window[0].1 >= window[1].1);
    }
    let mut returned: Vec<(Vec<u8>, u32)> = results.clone();
    returned.sort();
    let mut inserted: Vec<(Vec<u8>, u32)> =
        corpus.iter().map(|(k, v)| (k.clone(), *v)).collect();
    inserted.sort();
    assert_eq!(returned, inserted);

    // Ties are broken deterministically.
    let rerun = complete_ranked::<MaxValueFirst>(&dic, &guide, b"");
    assert_eq!(results, rerun);
    Ok(())
}
