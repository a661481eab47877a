use std::io;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use zdict::{
    train, validate_dictionary, CancelToken, Codec, CompressionLevel, DictError, DictionaryHeader,
    SegmentOrder, StopReason, Trainer, TrainerConfig, ZstdCodec,
};

fn random_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}

/// `count` samples drawn from one seeded stream; sample `i` holds its first `1024 + i` bytes.
fn similar_samples(seed: u64, count: usize) -> Vec<Vec<u8>> {
    let stream = random_bytes(seed, 1024 + count);
    (0..count).map(|i| stream[..1024 + i].to_vec()).collect()
}

fn config(max_dict_size: usize, hash_bytes: usize) -> TrainerConfig {
    TrainerConfig::builder()
        .max_dict_size(max_dict_size)
        .hash_bytes(hash_bytes)
        .build()
        .expect("valid configuration")
}

fn compressed_total(dict: &[u8], samples: &[Vec<u8>], level: CompressionLevel) -> usize {
    let report = validate_dictionary(
        &ZstdCodec,
        dict,
        samples,
        level,
        &CancelToken::new(),
        &mut io::sink(),
    )
    .expect("every sample round trips");
    report.compressed_bytes
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

#[test]
fn similar_samples_fit_in_4k_at_every_level() {
    let samples = similar_samples(42, 32);
    for level in CompressionLevel::ALL {
        let cfg = TrainerConfig::builder()
            .max_dict_size(2048)
            .hash_bytes(4)
            .level(level)
            .build()
            .unwrap();
        let dict = train(&samples, &cfg).expect("training succeeds");
        assert!(!dict.is_empty());
        assert!(dict.len() <= 2048, "dictionary of {} bytes", dict.len());

        let total = compressed_total(&dict, &samples, level);
        assert!(total <= 4096, "level {level}: {total} compressed bytes");
    }
}

#[test]
fn shared_prefix_becomes_the_dictionary() {
    let samples = similar_samples(42, 32);
    let artifacts = Trainer::new(config(2048, 4)).train(&samples).unwrap();
    assert_eq!(artifacts.dictionary.as_bytes(), &samples[0][..]);
    assert_eq!(artifacts.metrics.segments(), 1);
    assert_eq!(artifacts.metrics.stop_reason, StopReason::CandidatesExhausted);
}

#[test]
fn training_is_deterministic() {
    let samples = similar_samples(7, 24);
    let cfg = config(1500, 6);
    let first = train(&samples, &cfg).unwrap();
    for _ in 0..3 {
        assert_eq!(train(&samples, &cfg).unwrap(), first);
    }

    let compat = TrainerConfig {
        compat_mode: true,
        dict_id: 99,
        ..cfg
    };
    assert_eq!(train(&samples, &compat).unwrap(), train(&samples, &compat).unwrap());
}

#[test]
fn larger_budget_never_compresses_worse() {
    let samples = similar_samples(42, 32);
    let small = train(&samples, &config(512, 4)).unwrap();
    let large = train(&samples, &config(2048, 4)).unwrap();
    assert!(small.len() <= 512);
    let level = CompressionLevel::Default;
    assert!(
        compressed_total(&large, &samples, level) <= compressed_total(&small, &samples, level)
    );
}

/// JSON-ish records sharing a header and footer around a random payload.
fn framed_records(count: u64) -> Vec<Vec<u8>> {
    (0..count)
        .map(|seed| {
            let mut record = br#"{"kind":"telemetry","schema":3,"source":"edge","payload":""#.to_vec();
            record.extend_from_slice(&random_bytes(500 + seed, 40));
            record.extend_from_slice(br#"","ok":true,"ttl":3600}"#);
            record.push(b'\n');
            record
        })
        .collect()
}

#[test]
fn larger_budget_never_compresses_worse_on_framed_records() {
    let samples = framed_records(64);
    let level = CompressionLevel::Default;
    let mut previous: Option<(usize, usize, Vec<u8>)> = None;
    for budget in [16usize, 32, 48, 64, 96, 128, 160, 256, 384, 512, 768] {
        let dict = train(&samples, &config(budget, 6)).unwrap();
        assert!(dict.len() <= budget);
        let total = compressed_total(&dict, &samples, level);
        if let Some((smaller_budget, smaller_total, smaller_dict)) = &previous {
            assert!(
                total <= *smaller_total,
                "budget {smaller_budget} -> {budget}: {smaller_total} -> {total} compressed bytes"
            );
            assert!(dict.len() >= smaller_dict.len());
        }
        previous = Some((budget, total, dict));
    }
}

#[test]
fn random_corpus_yields_no_meaningful_dictionary() {
    let samples: Vec<Vec<u8>> = (0..8).map(|seed| random_bytes(1000 + seed, 1024)).collect();
    match train(&samples, &config(2048, 6)) {
        Err(err) => assert!(err.is_empty_dictionary(), "unexpected error {err}"),
        Ok(dict) => assert!(dict.len() <= 64, "random data produced {} bytes", dict.len()),
    }
}

#[test]
fn two_samples_share_one_substring() {
    let shared = random_bytes(5, 300);
    let mut first = random_bytes(6, 500);
    first.extend_from_slice(&shared);
    first.extend_from_slice(&random_bytes(7, 200));
    let mut second = random_bytes(8, 120);
    second.extend_from_slice(&shared);
    second.extend_from_slice(&random_bytes(9, 700));

    let samples = vec![first, second];
    let dict = train(&samples, &config(2048, 6)).unwrap();
    assert!(dict.len() >= 6);
    assert!(contains(&samples[0], &dict));
    assert!(contains(&samples[1], &dict));
    assert!(contains(&dict, &shared[6..shared.len() - 6]));
}

#[test]
fn zero_budget_is_rejected() {
    let cfg = TrainerConfig {
        max_dict_size: 0,
        ..TrainerConfig::default()
    };
    let err = train(&similar_samples(1, 4), &cfg).unwrap_err();
    assert!(matches!(err, DictError::InvalidConfig(_)));
}

#[test]
fn single_sample_is_an_empty_corpus() {
    let samples = similar_samples(1, 1);
    let err = train(&samples, &config(2048, 4)).unwrap_err();
    assert!(matches!(err, DictError::EmptyCorpus { found: 1 }));
}

#[test]
fn size_bound_holds_for_many_budgets() {
    let samples = similar_samples(3, 16);
    for budget in [4usize, 16, 100, 1023, 1024, 1025, 4096] {
        let dict = train(&samples, &config(budget, 4)).unwrap();
        assert!(dict.len() <= budget, "budget {budget}: {} bytes", dict.len());
    }
    for budget in [300usize, 700, 1280, 4096] {
        let cfg = TrainerConfig {
            compat_mode: true,
            ..config(budget, 4)
        };
        let dict = train(&samples, &cfg).unwrap();
        assert!(dict.len() <= budget, "compat budget {budget}: {} bytes", dict.len());
    }
}

#[test]
fn compat_dictionary_loads_in_zstd() {
    let samples = similar_samples(42, 32);
    let cfg = TrainerConfig::builder()
        .max_dict_size(2048)
        .hash_bytes(4)
        .compat_mode(true)
        .dict_id(0x0001_2345)
        .build()
        .unwrap();
    let artifacts = Trainer::new(cfg).train(&samples).unwrap();
    let dict = artifacts.dictionary.as_bytes();
    assert!(dict.len() <= 2048);
    assert_eq!(&dict[..4], &0xEC30_A437u32.to_le_bytes());
    assert_eq!(&dict[4..8], &0x0001_2345u32.to_le_bytes());

    let header = DictionaryHeader::parse(dict).unwrap();
    assert!(header.compat);
    assert_eq!(header.dict_id, 0x0001_2345);
    assert_eq!(header.header_len, artifacts.dictionary.header_len());
    assert_eq!(&dict[header.header_len..], &samples[0][..]);

    for level in CompressionLevel::ALL {
        let total = compressed_total(dict, &samples, level);
        assert!(total <= 4096, "level {level}: {total} compressed bytes");
    }
}

#[test]
fn short_samples_still_round_trip() {
    let mut samples = similar_samples(11, 6);
    samples.push(b"ab".to_vec());
    samples.push(Vec::new());
    let dict = train(&samples, &config(1024, 8)).unwrap();
    let codec = ZstdCodec;
    for sample in &samples {
        let packed = codec.compress(sample, &dict, CompressionLevel::Fastest).unwrap();
        assert_eq!(&codec.decompress(&packed, &dict).unwrap(), sample);
    }
}

#[test]
fn segment_order_controls_placement() {
    let head = b"<record kind=\"alpha\" version=\"1\">".to_vec();
    let tail = b"</payload></record>".to_vec();
    let samples: Vec<Vec<u8>> = (0..6u8)
        .map(|i| {
            let mut sample = head.clone();
            if i % 2 == 0 {
                sample.extend_from_slice(&tail);
            }
            sample.extend_from_slice(&random_bytes(u64::from(i), 16));
            sample
        })
        .collect();
    let first = TrainerConfig {
        segment_order: SegmentOrder::MostBenefitFirst,
        ..config(4096, 6)
    };
    let last = TrainerConfig {
        segment_order: SegmentOrder::MostBenefitLast,
        ..first.clone()
    };
    let leading = train(&samples, &first).unwrap();
    let trailing = train(&samples, &last).unwrap();
    assert!(leading.starts_with(&head));
    assert!(trailing.ends_with(&head));
}
