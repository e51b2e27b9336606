use chrono::NaiveDate;

use super::*;
use filings::repair_year;
use headers::HeaderStripper;
use normalize::Normalizer;
use pages::MarkedPage;
use record::CaseStatus;

fn parser() -> BulletinParser {
    BulletinParser::new().expect("parser patterns compile")
}

fn bulletin() -> BulletinContext {
    BulletinContext {
        publication_date: "2026-01-09".to_string(),
        bulletin_number: Some(5),
    }
}

fn parse_single_page(text: &str) -> PageOutcome {
    let parser = parser();
    let mut state = ParserState::default();
    let mut seen = SeenRecords::default();
    parser.parse_page(text, 3, &bulletin(), &mut state, &mut seen)
}

fn defendants(raw: &str) -> Vec<String> {
    parser().splitter.defendants().split(raw).names
}

#[test]
fn normalize_is_idempotent() {
    let normalizer = Normalizer::new().expect("normalizer compiles");
    let samples = [
        "",
        "  Juan   Pérez \r\n vs.\tPedro  ",
        "PRIMERA SALA CIVIL\n\n\n\n\nInmobiliaria “Centro” vs. Ana",
        "Controv. Arrend. T. 942-2019-\n\n\n003 2 Acdos.",
        "T. 1/2024/\n2/2024/\n\n7 Sent.",
    ];

    for sample in samples {
        let once = normalizer.normalize(sample);
        assert_eq!(normalizer.normalize(&once), once, "sample: {sample:?}");
    }
}

#[test]
fn normalize_rejoins_wrapped_expediente_and_ascii_quotes() {
    let normalizer = Normalizer::new().expect("normalizer compiles");

    let text = normalizer.normalize("Controv. Arrend. T. 942-2019-\n\n\n003 2 Acdos.");
    assert_eq!(text, "Controv. Arrend. T. 942-2019-003 2 Acdos.");

    let quoted = normalizer.normalize("Inmobiliaria “Centro” y ‘Sur’");
    assert_eq!(quoted, "Inmobiliaria \"Centro\" y 'Sur'");

    let spaced = normalizer.normalize("  a  \r\nb\r\r\r\rc  ");
    assert_eq!(spaced, "a\nb\n\nc");
}

#[test]
fn chamber_state_never_regresses_to_generic() {
    let tracker = ChamberTracker::new().expect("chamber patterns compile");
    let mut state = ParserState::default();

    tracker.update_chamber("SALA CIVIL", &mut state);
    assert_eq!(state.last_known_chamber.as_deref(), Some("SALA CIVIL"));

    tracker.update_chamber("PRIMERA SALA CIVIL\nJuan vs. Pedro", &mut state);
    assert_eq!(state.last_known_chamber.as_deref(), Some("PRIMERA SALA CIVIL"));

    tracker.update_chamber("texto\nSALA C1VIL\nmás texto", &mut state);
    assert_eq!(state.last_known_chamber.as_deref(), Some("PRIMERA SALA CIVIL"));

    tracker.update_chamber("SEGUNDA SALA CIVIL", &mut state);
    assert_eq!(state.last_known_chamber.as_deref(), Some("SEGUNDA SALA CIVIL"));
}

#[test]
fn chamber_ordinal_is_recovered_from_preceding_header_words() {
    let tracker = ChamberTracker::new().expect("chamber patterns compile");

    let mentions = tracker.mentions("TERCERA SECRETARIA\nSALA CIVIL");
    assert_eq!(mentions.len(), 1);
    assert_eq!(mentions[0].name, "TERCERA SALA CIVIL");

    let prose = tracker.mentions("la primera audiencia ante la SALA CIVIL");
    assert_eq!(prose[0].name, "SALA CIVIL");

    let accented = tracker.mentions("SÉPTIMA SALA CIVIL");
    assert_eq!(accented[0].name, "SÉPTIMA SALA CIVIL");

    let mixed_case = tracker.mentions("Séptima Sala Civil");
    assert_eq!(mixed_case[0].name, "SÉPTIMA SALA CIVIL");
}

#[test]
fn chamber_at_prefers_carried_specific_over_generic_mention() {
    let tracker = ChamberTracker::new().expect("chamber patterns compile");
    let carried = ParserState {
        last_known_chamber: Some("CUARTA SALA CIVIL".to_string()),
    };

    let text = "SALA CIVIL\nJuan vs. Pedro";
    assert_eq!(
        tracker.chamber_at(text, text.len(), &carried).as_deref(),
        Some("CUARTA SALA CIVIL")
    );
    assert_eq!(
        tracker
            .chamber_at(text, text.len(), &ParserState::default())
            .as_deref(),
        Some("SALA CIVIL")
    );
    assert_eq!(
        tracker
            .chamber_at("sin mención", 5, &ParserState::default())
            .as_deref(),
        None
    );
}

#[test]
fn chamber_at_keeps_earlier_specific_mention_over_later_generic_one() {
    let tracker = ChamberTracker::new().expect("chamber patterns compile");
    let filler = "texto de relleno ".repeat(15);
    let text = format!("SEGUNDA SALA CIVIL\n{filler}\nSALA CIVIL\nJuan vs. Pedro");

    let mentions = tracker.mentions(&text);
    assert_eq!(mentions.len(), 2);
    assert_eq!(mentions[1].name, "SALA CIVIL");

    assert_eq!(
        tracker
            .chamber_at(&text, text.len(), &ParserState::default())
            .as_deref(),
        Some("SEGUNDA SALA CIVIL")
    );
}

#[test]
fn two_case_block_yields_cross_product_records() {
    let outcome = parse_single_page(
        "Empresa Uno S.A. de C.V. vs. Pedro Sánchez y Ana Ruiz Controv. de Arrendamiento T. 10/2024/001 1 Acdo. María Torres vs. Jorge Núñez Ejec. Merc. T. 20/2024/002 Sent.",
    );

    assert_eq!(outcome.stats.cases_located, 2);
    assert_eq!(outcome.records.len(), 3);

    let first = &outcome.records[0];
    assert_eq!(first.plaintiff.as_deref(), Some("Empresa Uno S.A. de C.V."));
    assert_eq!(first.defendant.as_deref(), Some("Pedro Sánchez"));
    assert_eq!(first.expediente_id, "T. 10/2024/001");
    assert_eq!(first.judgment_type, "Controv. de Arrendamiento");
    assert_eq!(first.status, Some(CaseStatus::Acdo));
    assert_eq!(first.status_count, Some(1));
    assert_eq!(first.page_number, Some(3));
    assert_eq!(first.publication_date, "2026-01-09");
    assert_eq!(first.bulletin_number, Some(5));
    assert_eq!(first.defendant_ordinal_label.as_deref(), Some("demandado: 1"));

    let second = &outcome.records[1];
    assert_eq!(second.defendant.as_deref(), Some("Ana Ruiz"));
    assert_eq!(second.expediente_id, "T. 10/2024/001");
    assert_eq!(second.defendant_ordinal_label.as_deref(), Some("demandado: 2"));

    let third = &outcome.records[2];
    assert_eq!(third.plaintiff.as_deref(), Some("María Torres"));
    assert_eq!(third.defendant.as_deref(), Some("Jorge Núñez"));
    assert_eq!(third.judgment_type, "Ejec. Merc.");
    assert_eq!(third.expediente_id, "T. 20/2024/002");
    assert_eq!(third.status, Some(CaseStatus::Sent));
    assert_eq!(third.status_count, None);
}

#[test]
fn every_defendant_pairs_with_every_filing() {
    let outcome = parse_single_page(
        "Inmobiliaria Sur vs. Carlos Vega y Laura Mora Controv. de Arrendamiento T. 30/2024/001 y 002 3 Acdos.",
    );

    let pairs = outcome
        .records
        .iter()
        .map(|record| {
            (
                record.defendant.clone().unwrap_or_default(),
                record.expediente_id.clone(),
                record.defendant_ordinal_label.clone().unwrap_or_default(),
            )
        })
        .collect::<Vec<_>>();
    assert_eq!(
        pairs,
        vec![
            ("Carlos Vega".to_string(), "T. 30/2024/001".to_string(), "demandado: 1".to_string()),
            ("Carlos Vega".to_string(), "T. 30/2024/002".to_string(), "demandado: 1".to_string()),
            ("Laura Mora".to_string(), "T. 30/2024/001".to_string(), "demandado: 2".to_string()),
            ("Laura Mora".to_string(), "T. 30/2024/002".to_string(), "demandado: 2".to_string()),
        ]
    );
    assert!(
        outcome
            .records
            .iter()
            .all(|record| record.status == Some(CaseStatus::Acdo) && record.status_count == Some(3))
    );
}

#[test]
fn case_without_recognized_type_emits_nothing() {
    let outcome = parse_single_page(
        "Juan Pérez vs. Banco Uno Ordinario Civil T. 5/2024/001 Sent.\nLuis Soto vs. Ana Gil Arrend T. 6/2024/001 Sent.",
    );

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.stats.cases_located, 2);
    assert_eq!(outcome.stats.skipped_without_type, 2);
}

#[test]
fn bare_keyword_is_a_last_resort_type() {
    let outcome = parse_single_page("Juan Pérez vs. Ana Gil Arrendamiento T. 6/2024/001 Sent.");

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].judgment_type, "Arrendamiento");
    assert_eq!(outcome.stats.fallback_types, 1);
}

#[test]
fn type_after_first_filing_is_contamination() {
    let outcome = parse_single_page(
        "Juan Pérez vs. Pedro Gil T. 5/2024/001 Controv. de Arrendamiento Sent.",
    );

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.stats.skipped_contaminated, 1);
}

#[test]
fn case_without_filing_is_skipped() {
    let outcome = parse_single_page("Juan Pérez vs. Pedro Gil Controv. de Arrendamiento Sent.");

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.stats.skipped_without_filing, 1);
}

#[test]
fn corporate_plaintiff_stays_whole() {
    let outcome = parse_single_page(
        "Banco Ejemplo, S.A., Institución de Banca Múltiple vs. Juan Pérez Controv. de Arrendamiento T. 123/2024/001",
    );

    assert_eq!(outcome.records.len(), 1);
    let record = &outcome.records[0];
    assert_eq!(
        record.plaintiff.as_deref(),
        Some("Banco Ejemplo, S.A., Institución de Banca Múltiple")
    );
    assert_eq!(record.defendant.as_deref(), Some("Juan Pérez"));
    assert_eq!(record.status, None);
    assert_eq!(record.status_count, None);
}

#[test]
fn defendant_list_splits_on_connector() {
    assert_eq!(
        defendants("María López y Juan García"),
        vec!["María López", "Juan García"]
    );
}

#[test]
fn alias_phrase_is_dropped() {
    assert_eq!(
        defendants("Pedro Ruiz quien también se ostenta como Pedro R. Gómez"),
        vec!["Pedro Ruiz"]
    );
    assert_eq!(
        defendants("Laura Ríos quien tambien utliza el nombre de Laura Rio"),
        vec!["Laura Ríos"]
    );
}

#[test]
fn corporate_commas_do_not_split_but_list_commas_do() {
    assert_eq!(
        defendants("Banco Ejemplo, S.A., Institución de Banca Múltiple"),
        vec!["Banco Ejemplo, S.A., Institución de Banca Múltiple"]
    );
    assert_eq!(
        defendants("Banco X, S.A. de C.V., Juan Pérez y María López"),
        vec!["Banco X, S.A. de C.V.", "Juan Pérez", "María López"]
    );
    assert_eq!(
        defendants("Ana Soto; Luis Mora e Irma Vega"),
        vec!["Ana Soto", "Luis Mora", "Irma Vega"]
    );
}

#[test]
fn extended_continuation_word_counts_a_divergence() {
    let list = parser()
        .splitter
        .defendants()
        .split("Arrendadora Uno, Sociedad Anónima");

    assert_eq!(list.names, vec!["Arrendadora Uno, Sociedad Anónima"]);
    assert_eq!(list.guard_divergences, 1);
}

#[test]
fn ocr_glued_connector_and_dropped_initial_are_repaired() {
    assert_eq!(
        defendants("Ana Gómez yBravo Hernández"),
        vec!["Ana Gómez", "Bravo Hernández"]
    );
    assert_eq!(
        defendants("E spejel Martínez Luis"),
        vec!["Espejel Martínez Luis"]
    );
    assert_eq!(defendants("Grupo A del Norte"), vec!["Grupo A del Norte"]);
}

#[test]
fn trailing_others_noise_and_repeats_are_removed() {
    assert_eq!(
        defendants("Juan Pérez, Juan pérez y Otros"),
        vec!["Juan Pérez"]
    );
    assert_eq!(defendants("Rosa Díaz; el"), vec!["Rosa Díaz"]);
}

#[test]
fn unsplittable_span_is_kept_whole() {
    assert_eq!(defendants("  otros  "), vec!["otros"]);
    assert!(defendants("   ").is_empty());
}

#[test]
fn hyphenated_year_missing_a_digit_is_repaired() {
    let extractor = FilingExtractor::new().expect("filing patterns compile");
    let filings = extractor.extract_filings(" T. 450-203-005 Sent.", StatusPolicy::NearestFollowing);

    assert_eq!(filings.len(), 1);
    assert_eq!(filings[0].expediente_id, "T. 450-2023-005");
    assert_eq!(repair_year("2019"), "2019");
    assert_eq!(repair_year("198"), "198");
}

#[test]
fn series_codes_and_short_sequences_are_canonicalized() {
    let extractor = FilingExtractor::new().expect("filing patterns compile");
    let filings = extractor.extract_filings(
        " T. Ap. 12/2024/7 Sent. T. 88-2022 2 Acdos.",
        StatusPolicy::NearestFollowing,
    );

    let ids = filings
        .iter()
        .map(|filing| filing.expediente_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["T. Ap 12/2024/007", "T. 88-2022"]);
    assert_eq!(filings[1].status_count, Some(2));
}

#[test]
fn series_code_survives_missing_or_glued_period() {
    let extractor = FilingExtractor::new().expect("filing patterns compile");
    let filings = extractor.extract_filings(
        " T Ap 1583/2024/007 Sent. T.Ap 9/2023/001 Sent. T 44/2022/010 Sent.",
        StatusPolicy::NearestFollowing,
    );

    let ids = filings
        .iter()
        .map(|filing| filing.expediente_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        ids,
        vec!["T. Ap 1583/2024/007", "T. Ap 9/2023/001", "T. 44/2022/010"]
    );
}

#[test]
fn status_policy_chooses_nearest_or_last() {
    let extractor = FilingExtractor::new().expect("filing patterns compile");
    let text = " T. 1/2024/001 2 Acdos. T. 2/2024/002 Sent.";

    let nearest = extractor.extract_filings(text, StatusPolicy::NearestFollowing);
    assert_eq!(nearest[0].status, Some(CaseStatus::Acdo));
    assert_eq!(nearest[0].status_count, Some(2));
    assert_eq!(nearest[1].status, Some(CaseStatus::Sent));

    let last = extractor.extract_filings(text, StatusPolicy::LastInCase);
    assert!(
        last.iter()
            .all(|filing| filing.status == Some(CaseStatus::Sent) && filing.status_count.is_none())
    );

    let uncounted = extractor.extract_filings(" T. 3/2024/003 Acdo.", StatusPolicy::NearestFollowing);
    assert_eq!(uncounted[0].status, Some(CaseStatus::Acdo));
    assert_eq!(uncounted[0].status_count, None);
}

#[test]
fn repeated_filing_is_emitted_once() {
    let extractor = FilingExtractor::new().expect("filing patterns compile");
    let filings = extractor.extract_filings(
        " T. 9/2024/001 Sent. T. 9/2024/001 Sent.",
        StatusPolicy::NearestFollowing,
    );
    assert_eq!(filings.len(), 1);
}

#[test]
fn duplicate_records_are_suppressed_within_a_run() {
    let parser = parser();
    let mut state = ParserState::default();
    let mut seen = SeenRecords::default();
    let page = "Rosa Díaz vs. Pedro Ruiz Controv. de Arrendamiento T. 5/2024/001 Sent.";

    let first = parser.parse_page(page, 2, &bulletin(), &mut state, &mut seen);
    let second = parser.parse_page(page, 2, &bulletin(), &mut state, &mut seen);

    assert_eq!(first.records.len(), 1);
    assert!(second.records.is_empty());
    assert_eq!(second.stats.duplicates_suppressed, 1);
}

#[test]
fn chamber_carries_across_pages_and_changes_mid_page() {
    let parser = parser();
    let mut state = ParserState::default();
    let mut seen = SeenRecords::default();

    let first = parser.parse_page(
        "PRIMERA SALA CIVIL\nInmobiliaria Norte vs. Luis Ramírez Controv. de Arrendamiento T. 1/2024/001 Sent.",
        2,
        &bulletin(),
        &mut state,
        &mut seen,
    );
    assert_eq!(first.records[0].chamber.as_deref(), Some("PRIMERA SALA CIVIL"));
    assert_eq!(state.last_known_chamber.as_deref(), Some("PRIMERA SALA CIVIL"));

    let second = parser.parse_page(
        "Rosa Díaz vs. Pedro Ruiz Controv. de Arrendamiento T. 5/2024/001 Sent.\nSEGUNDA SALA CIVIL\nLuis Mora vs. Ana Vega Controv. de Arrendamiento T. 6/2024/002 2 Acdos.",
        3,
        &bulletin(),
        &mut state,
        &mut seen,
    );
    assert_eq!(second.records.len(), 2);
    assert_eq!(second.records[0].chamber.as_deref(), Some("PRIMERA SALA CIVIL"));
    assert_eq!(second.records[1].chamber.as_deref(), Some("SEGUNDA SALA CIVIL"));
    assert_eq!(second.records[1].plaintiff.as_deref(), Some("Luis Mora"));
    assert_eq!(state.last_known_chamber.as_deref(), Some("SEGUNDA SALA CIVIL"));
}

fn locate(text: &str, mode: BoundaryMode) -> Vec<(String, String)> {
    let locator = CaseLocator::new().expect("boundary patterns compile");
    locator
        .locate_cases(text, mode)
        .into_iter()
        .map(|span| {
            (
                text[span.start..span.separator_start].to_string(),
                text[span.start..span.end].to_string(),
            )
        })
        .collect()
}

#[test]
fn intervening_separator_moves_case_start_past_it() {
    let spans = locate("Ana Gil vs. Luis Paz Beto Ruiz vs. Carla Sol", BoundaryMode::NextSeparator);
    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].1, "Ana Gil vs. ");
    assert_eq!(spans[1].0, "Luis Paz Beto Ruiz ");

    let spans = locate(
        "Encabezado\n\nAna Gil vs. Luis Paz\nBeto Ruiz vs. Carla Sol",
        BoundaryMode::NextSeparator,
    );
    assert_eq!(spans[0].0, "Ana Gil ");
    assert_eq!(spans[0].1, "Ana Gil vs. Luis Paz\n");
    assert_eq!(spans[1].0, "Beto Ruiz ");
    assert_eq!(spans[1].1, "Beto Ruiz vs. Carla Sol");
}

#[test]
fn no_publicado_closes_the_previous_case() {
    let spans = locate(
        "Ana Gil vs. Luis Paz T. 1/2024/001 No Publicado Beto Ruiz vs. Carla Sol",
        BoundaryMode::NextSeparator,
    );
    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].1, "Ana Gil vs. Luis Paz T. 1/2024/001 No Publicado ");
    assert_eq!(spans[1].0, "Beto Ruiz ");
}

#[test]
fn case_start_falls_back_to_blank_line_then_newline_then_window_edge() {
    let blank_line = locate("Título\n\nJuan Pérez\nGrupo Sur vs. Pedro", BoundaryMode::NextSeparator);
    assert_eq!(blank_line[0].0, "Juan Pérez\nGrupo Sur ");

    let single_newline = locate("Título\nGrupo Sur vs. Pedro", BoundaryMode::NextSeparator);
    assert_eq!(single_newline[0].0, "Grupo Sur ");

    let no_newline = locate("Grupo Sur vs. Pedro", BoundaryMode::NextSeparator);
    assert_eq!(no_newline[0].0, "Grupo Sur ");

    let locator = CaseLocator::new().expect("boundary patterns compile");
    let long = format!("{} vs. Pedro", "a".repeat(9_000));
    let spans = locator.locate_cases(&long, BoundaryMode::NextSeparator);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].separator_start, 9_001);
    assert_eq!(spans[0].start, 9_001 - 8_000);
}

#[test]
fn status_line_mode_ends_case_at_its_status_line() {
    let text = "Ana Gil vs. Luis Paz Controv. de Arrendamiento T. 1/2024/001 2 Acdos.\nSECRETARÍA DE ACUERDOS\nfin de lista";

    let status_line = locate(text, BoundaryMode::StatusLine);
    assert_eq!(status_line.len(), 1);
    assert_eq!(
        status_line[0].1,
        "Ana Gil vs. Luis Paz Controv. de Arrendamiento T. 1/2024/001 2 Acdos."
    );

    let next_separator = locate(text, BoundaryMode::NextSeparator);
    assert_eq!(next_separator[0].1, text);
}

#[test]
fn plaintiff_headers_are_stripped() {
    let headers = HeaderStripper::new().expect("header patterns compile");

    assert_eq!(
        headers
            .strip("BOLETÍN JUDICIAL No. 5 Viernes 9 de enero de 2026\nlo. 3 Inmobiliaria Centro")
            .as_deref(),
        Some("Inmobiliaria Centro")
    );
    assert_eq!(
        headers
            .strip("Viernes 9 de enero de 2026 Inmobiliaria Centro")
            .as_deref(),
        Some("Inmobiliaria Centro")
    );
    assert_eq!(
        headers.strip("AS Grupo Inmobiliario").as_deref(),
        Some("Grupo Inmobiliario")
    );
    assert_eq!(headers.strip("PRIMERA SALA CIVIL\n"), None);
    assert_eq!(headers.strip("BOLETÍN JUDICIAL\nPÁGINA 3/12\n"), None);
    assert_eq!(
        headers
            .strip("PRIMERA SALA CIVIL Inmobiliaria Norte")
            .as_deref(),
        Some("Inmobiliaria Norte")
    );
    assert_eq!(
        headers.strip("Boletín Inmobiliaria").as_deref(),
        Some("Inmobiliaria")
    );
    assert_eq!(
        headers
            .strip("SALA CIVIL\nSEGUNDA SALA CIVIL Grupo Sur")
            .as_deref(),
        Some("Grupo Sur")
    );
}

#[test]
fn plaintiff_sharing_a_line_with_a_header_is_kept() {
    let outcome = parse_single_page(
        "PRIMERA SALA CIVIL Inmobiliaria Norte vs. Luis Ramírez Controv. de Arrendamiento T. 1/2024/001 Sent.",
    );
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(
        outcome.records[0].plaintiff.as_deref(),
        Some("Inmobiliaria Norte")
    );
    assert_eq!(
        outcome.records[0].chamber.as_deref(),
        Some("PRIMERA SALA CIVIL")
    );

    let outcome = parse_single_page(
        "Rosa Díaz vs. Pedro Ruiz Controv. de Arrendamiento T. 5/2024/001 Sent.\nBoletín Inmobiliaria vs. Luis Mora Controv. de Arrendamiento T. 6/2024/002 Sent.",
    );
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.records[1].plaintiff.as_deref(), Some("Inmobiliaria"));
    assert_eq!(outcome.records[1].defendant.as_deref(), Some("Luis Mora"));
}

#[test]
fn plaintiff_on_line_before_separator_is_kept() {
    let outcome = parse_single_page(
        "Juan Pérez\nvs. Pedro Gil Controv. de Arrendamiento T. 5/2024/001 Sent.",
    );

    assert_eq!(outcome.records[0].plaintiff.as_deref(), Some("Juan Pérez"));
}

#[test]
fn document_mode_uses_page_markers() {
    let parser = parser();
    let mut state = ParserState::default();
    let mut seen = SeenRecords::default();
    let raw = "PAGINA 1/2\nBOLETÍN JUDICIAL\nPRIMERA SALA CIVIL\nInmobiliaria Norte S.A. vs. Luis Ramírez Controv. Arrend. T. 942-2019-003 y 006 2 Acdos.\nPAGINA 2/2\nBOLETÍN JUDICIAL\nRosa Díaz vs. Pedro Ruiz quien también se ostenta como Pedro R. Gómez Especial de Arrendamiento Oral T. 77/2023/010 Sent.";

    let outcome = parser.parse_document(raw, &bulletin(), &mut state, &mut seen);

    assert_eq!(outcome.total_pages, Some(2));
    assert_eq!(outcome.records.len(), 3);

    let ids = outcome
        .records
        .iter()
        .map(|record| record.expediente_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["T. 942-2019-003", "T. 942-2019-006", "T. 77/2023/010"]);

    let first = &outcome.records[0];
    assert_eq!(first.plaintiff.as_deref(), Some("Inmobiliaria Norte S.A."));
    assert_eq!(first.judgment_type, "Controv. Arrend.");
    assert_eq!(first.status, Some(CaseStatus::Acdo));
    assert_eq!(first.status_count, Some(2));
    assert_eq!(first.page_number, Some(1));
    assert_eq!(first.chamber.as_deref(), Some("PRIMERA SALA CIVIL"));

    let last = &outcome.records[2];
    assert_eq!(last.plaintiff.as_deref(), Some("Rosa Díaz"));
    assert_eq!(last.defendant.as_deref(), Some("Pedro Ruiz"));
    assert_eq!(last.judgment_type, "Especial de Arrendamiento Oral");
    assert_eq!(last.status, Some(CaseStatus::Sent));
    assert_eq!(last.page_number, Some(2));
    assert_eq!(last.chamber.as_deref(), Some("PRIMERA SALA CIVIL"));
    assert_eq!(state.last_known_chamber.as_deref(), Some("PRIMERA SALA CIVIL"));
}

#[test]
fn marked_pages_keep_preamble_and_map_offsets() {
    let splitter = PageSplitter::new().expect("page patterns compile");
    let document = splitter
        .split_marked_pages("Portada\nPAGINA 1/3\nuno\nPÁGINA 2/3\ndos")
        .expect("markers present");

    assert_eq!(document.total_pages, Some(3));
    assert_eq!(document.pages.len(), 2);
    assert_eq!(document.pages[0].number, 1);
    assert!(document.pages[0].text.starts_with("Portada"));
    assert!(document.pages[0].text.contains("uno"));
    assert_eq!(document.pages[1].number, 2);
    assert!(splitter.split_marked_pages("sin marcas").is_none());

    let mut map = PageMap::default();
    map.push(0, 1);
    map.push(40, 2);
    assert_eq!(map.page_at(0), Some(1));
    assert_eq!(map.page_at(39), Some(1));
    assert_eq!(map.page_at(40), Some(2));
    assert_eq!(map.page_at(500), Some(2));
}

#[test]
fn running_headers_repeated_on_three_pages_are_dropped() {
    let mut pages = (1..=3)
        .map(|number| MarkedPage {
            number,
            text: format!("\nBOLETÍN  JUDICIAL\nContenido {number}"),
        })
        .collect::<Vec<_>>();
    pages.push(MarkedPage {
        number: 4,
        text: "Otro encabezado\nContenido 4".to_string(),
    });

    let removed = pages::strip_running_headers(&mut pages);

    assert_eq!(removed, 3);
    assert!(!pages[0].text.contains("BOLETÍN"));
    assert!(pages[0].text.contains("Contenido 1"));
    assert!(pages[3].text.contains("Otro encabezado"));
}

#[test]
fn cover_page_yields_date_number_and_start_page() {
    let parser = parser();
    let cover = parser.parse_cover(
        "BOLETÍN JUDICIAL\nÓRGANO DEL TRIBUNAL\nNúm. 12\nViernes 9 de enero del 2026\nÍNDICE\nSALAS 5",
    );

    assert_eq!(cover.publication_date, NaiveDate::from_ymd_opt(2026, 1, 9));
    assert_eq!(cover.bulletin_number, Some(12));
    assert_eq!(cover.columns_start_page, Some(3));

    let ocr = parser.parse_cover("Nun 7 martes 1 de setiembre de 2025 SALAS 2");
    assert_eq!(ocr.publication_date, NaiveDate::from_ymd_opt(2025, 9, 1));
    assert_eq!(ocr.bulletin_number, Some(7));
    assert_eq!(ocr.columns_start_page, Some(1));

    let invalid = parser.parse_cover("31 de febrero de 2025");
    assert_eq!(invalid, CoverInfo::default());
}

#[test]
fn form_feed_pages_split_in_order() {
    assert_eq!(
        split_form_feed_pages("portada\u{000C}uno\u{000C}dos"),
        vec!["portada", "uno", "dos"]
    );
}
