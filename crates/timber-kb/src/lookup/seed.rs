//! Bundled reference rows for the in-memory store.
//!
//! Figures follow the published LVL/MGP span guides and AS 1684.2 at the
//! standard 450mm and 600mm spacings. Rows are dimension tuples with one
//! authoritative max span each; conflicting rows are never averaged.

use crate::types::{LoadType, MemberType, SpanTableEntry, TimberGradeEntry};

fn row(
    member_type: MemberType,
    timber_type: &str,
    stress_grade: &str,
    species: Option<&str>,
    size: &str,
    load_type: LoadType,
    spacing_mm: u32,
    continuous: bool,
    max_span_mm: u32,
    source: &str,
) -> SpanTableEntry {
    let (width_mm, depth_mm) = size
        .split_once('x')
        .and_then(|(w, d)| Some((w.parse().ok()?, d.parse().ok()?)))
        .expect("seed sizes are WxD");
    SpanTableEntry {
        member_type,
        timber_type: timber_type.to_string(),
        stress_grade: stress_grade.to_string(),
        species: species.map(|s| s.to_string()),
        size: size.to_string(),
        width_mm,
        depth_mm,
        load_type,
        spacing_mm,
        continuous,
        max_span_mm,
        source: source.to_string(),
    }
}

pub fn span_rows() -> Vec<SpanTableEntry> {
    use LoadType::*;
    use MemberType::*;

    const E14: &str = "Wesbeam E14 Guide";
    const AS1684: &str = "AS 1684.2 Span Tables";

    vec![
        // LVL (Wesbeam E14) bearers
        row(Bearer, "LVL", "E14", None, "140x45", Floor, 450, false, 2800, E14),
        row(Bearer, "LVL", "E14", None, "140x45", Floor, 450, true, 3100, E14),
        row(Bearer, "LVL", "E14", None, "190x45", Floor, 450, false, 3400, E14),
        row(Bearer, "LVL", "E14", None, "240x45", Floor, 450, false, 4100, E14),
        row(Bearer, "LVL", "E14", None, "140x45", Deck, 450, false, 2600, E14),
        row(Bearer, "LVL", "E14", None, "190x45", Deck, 450, false, 3200, E14),
        // LVL joists
        row(Joist, "LVL", "E14", None, "140x45", Floor, 450, false, 3100, E14),
        row(Joist, "LVL", "E14", None, "190x45", Floor, 450, false, 3900, E14),
        row(Joist, "LVL", "E14", None, "240x45", Floor, 450, false, 4600, E14),
        // MGP10 pine joists and bearers
        row(Joist, "MGP10", "MGP10", None, "90x45", Floor, 450, false, 1800, AS1684),
        row(Joist, "MGP10", "MGP10", None, "140x45", Floor, 450, false, 2700, AS1684),
        row(Joist, "MGP10", "MGP10", None, "190x45", Floor, 450, false, 3300, AS1684),
        row(Bearer, "MGP10", "MGP10", None, "140x45", Floor, 450, false, 2400, AS1684),
        row(Bearer, "MGP12", "MGP12", None, "140x45", Floor, 450, false, 2600, AS1684),
        // Rafters at roof spacing
        row(Rafter, "MGP10", "MGP10", None, "90x45", Roof, 600, false, 2000, AS1684),
        row(Rafter, "MGP10", "MGP10", None, "140x45", Roof, 600, false, 3100, AS1684),
        row(Rafter, "MGP12", "MGP12", None, "140x45", Roof, 600, false, 3400, AS1684),
        // Deck members
        row(DeckingJoist, "MGP10", "MGP10", None, "140x45", Deck, 450, false, 2400, AS1684),
        row(DeckingJoist, "MGP10", "MGP10", None, "90x45", Deck, 450, false, 1500, AS1684),
        // Lintels
        row(Lintel, "MGP12", "MGP12", None, "190x45", Roof, 450, false, 2100, AS1684),
        row(Lintel, "LVL", "E14", None, "240x45", Roof, 450, false, 3000, E14),
        // Hardwood
        row(Bearer, "hardwood", "F27", Some("spotted_gum"), "140x45", Floor, 450, false, 2900, AS1684),
        row(Bearer, "hardwood", "F27", Some("spotted_gum"), "190x45", Floor, 450, false, 3600, AS1684),
        row(Joist, "hardwood", "F27", Some("blackbutt"), "140x45", Deck, 450, false, 2600, AS1684),
        row(Joist, "hardwood", "F17", Some("ironbark"), "140x45", Floor, 450, false, 2800, AS1684),
    ]
}

pub fn grade_rows() -> Vec<TimberGradeEntry> {
    vec![
        TimberGradeEntry {
            grade: "MGP10".to_string(),
            stress_grade: "MGP10".to_string(),
            durability_class: "4".to_string(),
            approved_uses: vec![
                "wall framing".to_string(),
                "floor joists".to_string(),
                "rafters".to_string(),
            ],
            treatment: Some("H3 required for exterior use".to_string()),
            in_ground_ok: false,
            density_kg_m3: 550,
            source: "AS 1720.1".to_string(),
        },
        TimberGradeEntry {
            grade: "MGP12".to_string(),
            stress_grade: "MGP12".to_string(),
            durability_class: "4".to_string(),
            approved_uses: vec![
                "wall framing".to_string(),
                "floor joists".to_string(),
                "lintels".to_string(),
            ],
            treatment: Some("H3 required for exterior use".to_string()),
            in_ground_ok: false,
            density_kg_m3: 560,
            source: "AS 1720.1".to_string(),
        },
        TimberGradeEntry {
            grade: "F17".to_string(),
            stress_grade: "F17".to_string(),
            durability_class: "2".to_string(),
            approved_uses: vec![
                "bearers".to_string(),
                "joists".to_string(),
                "lintels".to_string(),
            ],
            treatment: None,
            in_ground_ok: false,
            density_kg_m3: 900,
            source: "AS 1720.1".to_string(),
        },
        TimberGradeEntry {
            grade: "F27".to_string(),
            stress_grade: "F27".to_string(),
            durability_class: "1".to_string(),
            approved_uses: vec![
                "bearers".to_string(),
                "joists".to_string(),
                "decking substructure".to_string(),
            ],
            treatment: None,
            in_ground_ok: false,
            density_kg_m3: 1010,
            source: "AS 1720.1".to_string(),
        },
        TimberGradeEntry {
            grade: "E14".to_string(),
            stress_grade: "E14".to_string(),
            durability_class: "4".to_string(),
            approved_uses: vec![
                "bearers".to_string(),
                "joists".to_string(),
                "lintels".to_string(),
            ],
            treatment: Some("H2S treated for termite resistance".to_string()),
            in_ground_ok: false,
            density_kg_m3: 600,
            source: "Wesbeam E14 Guide".to_string(),
        },
    ]
}
