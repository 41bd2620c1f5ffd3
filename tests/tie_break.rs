use rowbind::{CellData, Converter};

#[derive(Debug, Default, Clone, PartialEq)]
struct Owner {
    id: String,
    email: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct OwnerFirst {
    owner: Owner,
    id: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct IdFirst {
    id: String,
    owner: Option<Owner>,
}

rowbind::record!(Owner {
    id => column(excel = "id"),
    email => column(excel = "Email"),
});

rowbind::record!(OwnerFirst {
    owner => nested,
    id => column(excel = "id"),
});

rowbind::record!(IdFirst {
    id => column(excel = "id"),
    owner => nested,
});

fn header() -> Vec<String> {
    vec!["id".to_string(), "Email".to_string()]
}

#[test]
fn shallow_field_wins_when_visited_last() {
    let converter = Converter::new(["id", "Email"]);
    let record = OwnerFirst {
        owner: Owner {
            id: "nested".into(),
            email: "a@example.com".into(),
        },
        id: "top".into(),
    };

    let row = converter.encode_rows(&header(), &[record]).remove(0);
    assert_eq!(
        row,
        vec![
            CellData::Text("top".into()),
            CellData::Text("a@example.com".into())
        ]
    );
}

#[test]
fn shallow_field_wins_when_visited_first() {
    let converter = Converter::new(["id", "Email"]);
    let record = IdFirst {
        id: "top".into(),
        owner: Some(Owner {
            id: "nested".into(),
            email: "b@example.com".into(),
        }),
    };

    let values = converter.encode_record(&record);
    let entry = values.get(0).expect("id column");
    assert_eq!(entry.value, CellData::Text("top".into()));
    assert_eq!(entry.depth, 1);
    assert_eq!(
        values.value(converter.columns(), "Email"),
        Some(&CellData::Text("b@example.com".into()))
    );
}

#[test]
fn blank_shallow_field_still_claims_the_column() {
    let converter = Converter::new(["id", "Email"]);
    let record = IdFirst {
        id: String::new(),
        owner: Some(Owner {
            id: "nested".into(),
            email: String::new(),
        }),
    };

    let values = converter.encode_record(&record);
    assert_eq!(values.value(converter.columns(), "id"), Some(&CellData::Text(String::new())));
}

#[test]
fn absent_optional_record_contributes_nothing() {
    let converter = Converter::new(["id", "Email"]);
    let record = IdFirst {
        id: "solo".into(),
        owner: None,
    };

    let row = converter.encode_rows(&header(), &[record]).remove(0);
    assert_eq!(row, vec![CellData::Text("solo".into()), CellData::Empty]);
}

#[test]
fn decoding_fills_every_field_bound_to_a_column() {
    let converter = Converter::new(["id", "Email"]);
    let rows = vec![
        header(),
        vec!["42".to_string(), "c@example.com".to_string()],
    ];

    let decoded: Vec<IdFirst> = converter.decode_rows(rows).expect("decode");
    assert_eq!(
        decoded,
        vec![IdFirst {
            id: "42".into(),
            owner: Some(Owner {
                id: "42".into(),
                email: "c@example.com".into(),
            }),
        }]
    );
}
