use fragseek::chemistry::{
    PROTON,
    neutral_mass_to_mz,
};
use fragseek::models::{
    DigestionConfig,
    MassTolerance,
    Peak,
    Protein,
    Spectrum,
};
use fragseek::{
    FragSeekError,
    SearchConfig,
    SearchEngine,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("fragseek=debug")
        .try_init();
}

fn toy_proteins() -> Vec<Protein> {
    vec![
        Protein::new("P1", "LRLRACGLNFADLMARQGLY"),
        Protein::new("P2", "AAASPPLLRCLVLTGFGGYD"),
        Protein::new("P3", "MKWVTFISLLFLFSSAYSRGVFRR"),
        Protein::new("P4", "EAHKSEIAHRFKDLGEEHFK"),
    ]
}

fn unmodified_config() -> SearchConfig {
    SearchConfig {
        fixed_modifications: vec![],
        variable_modifications: vec![],
        max_variable_mods: 0,
        digestion: DigestionConfig::default(),
        ..Default::default()
    }
}

fn built_engine() -> SearchEngine {
    init_logging();
    let mut engine = SearchEngine::new(unmodified_config()).unwrap();
    engine.build(toy_proteins()).unwrap();
    engine
}

/// Charge 2 precursor with the singly charged b and y ions of `stripped`.
fn synthetic_spectrum(engine: &SearchEngine, id: &str, stripped: &str, charge: u8) -> Spectrum {
    let index = engine.index().unwrap();
    let idx = index
        .catalog()
        .iter()
        .position(|p| p.form.stripped_sequence() == stripped)
        .unwrap();
    let mass = index.catalog().at(idx).unwrap().monoisotopic;
    let mut peaks: Vec<Peak> = index
        .records()
        .iter()
        .filter(|r| r.peptide_idx as usize == idx)
        .enumerate()
        .map(|(i, r)| Peak {
            mz: r.mass + PROTON,
            intensity: 1000.0 - 10.0 * i as f32,
        })
        .collect();
    peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
    Spectrum::new(id, neutral_mass_to_mz(mass, 2), charge, Some(1.0), peaks)
}

#[test]
fn test_identifies_synthetic_spectrum() {
    let engine = built_engine();
    let spectrum = synthetic_spectrum(&engine, "scan=1", "AAASPPLLR", 2);
    let matches = engine.search_spectrum(&spectrum).unwrap();
    assert_eq!(matches.len(), 1);
    let top = &matches[0];
    assert_eq!(top.rank, 1);
    assert_eq!(top.stripped_sequence, "AAASPPLLR");
    assert_eq!(top.protein, "P2");
    assert_eq!(top.charge, 2);
    assert_eq!(top.isotope_offset, 0);
    assert!(!top.is_decoy);
    assert!(top.hyperscore > 0.0);
    assert!(top.matched_tag_peaks >= 2);
    assert!(top.precursor_error_ppm.abs() < 1.0);
    assert!(top.prefix_fraction > 0.0 && top.prefix_fraction <= 1.0);
    assert!(top.suffix_fraction > 0.0 && top.suffix_fraction <= 1.0);
}

#[test]
fn test_unknown_charge_tries_range() {
    let engine = built_engine();
    let spectrum = synthetic_spectrum(&engine, "scan=2", "AAASPPLLR", 0);
    let matches = engine.search_spectrum(&spectrum).unwrap();
    assert_eq!(matches[0].stripped_sequence, "AAASPPLLR");
    assert_eq!(matches[0].charge, 2);
}

#[test]
fn test_batch_search_keeps_input_order() {
    let engine = built_engine();
    let spectra = vec![
        synthetic_spectrum(&engine, "a", "DLGEEHFK", 2),
        synthetic_spectrum(&engine, "b", "AAASPPLLR", 2),
        Spectrum::new("empty", 400.0, 2, None, vec![]),
    ];
    let outcome = engine.search(&spectra).unwrap();
    assert_eq!(outcome.n_searched, 3);
    assert_eq!(outcome.n_failed, 0);
    let ids: Vec<&str> = outcome.matches.iter().map(|m| m.spectrum_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(outcome.matches[0].stripped_sequence, "DLGEEHFK");
    assert_eq!(outcome.matches[1].stripped_sequence, "AAASPPLLR");
}

#[test]
fn test_search_is_deterministic() {
    let engine = built_engine();
    let spectra: Vec<Spectrum> = ["AAASPPLLR", "DLGEEHFK", "ACGLNFADLMAR"]
        .iter()
        .enumerate()
        .map(|(i, s)| synthetic_spectrum(&engine, &format!("s{i}"), s, 2))
        .collect();
    let first = engine.search(&spectra).unwrap();
    let second = engine.search(&spectra).unwrap();
    assert_eq!(first.matches, second.matches);
}

#[test]
fn test_search_requires_build() {
    let engine = SearchEngine::new(unmodified_config()).unwrap();
    let spectrum = Spectrum::new("x", 500.0, 2, None, vec![]);
    assert!(matches!(
        engine.search(&[spectrum]),
        Err(FragSeekError::InvalidState { .. })
    ));
}

#[test]
fn test_overlapping_precursor_windows_count_hits_once() {
    init_logging();
    // The +1 Da variant of each R peptide only falls in the isotope 0
    // window, so the isotope 0 and 1 windows overlap without being equal.
    let config = |isotope_offsets: Vec<i8>| SearchConfig {
        variable_modifications: vec!["Shifted (R) +1.0".to_string()],
        max_variable_mods: 1,
        precursor_tolerance: MassTolerance::Absolute(1.5),
        isotope_offsets,
        report_top_hits: 10,
        ..unmodified_config()
    };
    let mut single = SearchEngine::new(config(vec![0])).unwrap();
    single.build(toy_proteins()).unwrap();
    let mut overlapping = SearchEngine::new(config(vec![0, 1])).unwrap();
    overlapping.build(toy_proteins()).unwrap();

    let spectrum = synthetic_spectrum(&single, "scan=3", "AAASPPLLR", 2);
    let target_idx = single
        .index()
        .unwrap()
        .catalog()
        .iter()
        .position(|p| p.form.stripped_sequence() == "AAASPPLLR")
        .unwrap() as u32;

    let find_target = |engine: &SearchEngine| {
        engine
            .search_spectrum(&spectrum)
            .unwrap()
            .into_iter()
            .find(|m| m.peptide_idx == target_idx)
            .unwrap()
    };
    let once = find_target(&single);
    let twice_covered = find_target(&overlapping);
    assert!(once.matched_tag_peaks > 0);
    assert_eq!(twice_covered.matched_tag_peaks, once.matched_tag_peaks);
    assert_eq!(twice_covered.tag_score, once.tag_score);
    assert_eq!(twice_covered.isotope_offset, 0);
}
