use crate::reconcile::{Transition, TransitionKind};
use crate::treemap::LayoutSnapshot;

pub fn snapshot_to_csv(snapshot: &LayoutSnapshot, mut w: impl std::io::Write) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(&mut w);
    writer.write_record(["kind", "id", "region", "value", "x", "y", "width", "height"])?;
    for e in snapshot.entries() {
        let kind = if e.is_leaf { "leaf" } else { "group" };
        writer.write_record([
            kind.to_string(),
            e.owner_id.key().to_string(),
            e.region.clone(),
            e.value.to_string(),
            e.rect.x.to_string(),
            e.rect.y.to_string(),
            e.rect.width.to_string(),
            e.rect.height.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn snapshot_to_json(snapshot: &LayoutSnapshot) -> serde_json::Value {
    serde_json::json!({
        "generated_at": chrono::Local::now().to_rfc3339(),
        "measure": snapshot.measure(),
        "bounds": snapshot.bounds(),
        "entries": snapshot.entries().collect::<Vec<_>>(),
    })
}

pub fn transitions_to_json(transitions: &[Transition]) -> serde_json::Value {
    serde_json::json!({
        "generated_at": chrono::Local::now().to_rfc3339(),
        "transitions": transitions.iter().map(|t| serde_json::json!({
            "owner": t.owner_id,
            "kind": match t.kind() {
                TransitionKind::Entering => "entering",
                TransitionKind::Updating => "updating",
                TransitionKind::Exiting => "exiting",
            },
            "from": t.from,
            "to": t.to,
        })).collect::<Vec<_>>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::measure::MeasureSet;
    use crate::model::Record;
    use crate::session::Session;

    fn session() -> Session {
        let records = vec![
            Record::new("A1", "A").with_measure("v", 10),
            Record::new("B1", "B").with_measure("v", 30),
        ];
        let config = Config {
            measures: MeasureSet::new(["v"]),
            initial_measure: "v".into(),
            ..Config::default()
        };
        Session::new(records, config).unwrap()
    }

    #[test]
    fn csv_has_one_row_per_entry() {
        let mut s = session();
        s.start().unwrap();
        let mut buf = Vec::new();
        snapshot_to_csv(s.snapshot().unwrap(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 4);
        assert!(lines[0].starts_with("kind,id,region"));
        assert!(lines[1].starts_with("group,A,A,10,"));
    }

    #[test]
    fn json_lists_transitions() {
        let mut s = session();
        let ts = s.start().unwrap();
        let json = transitions_to_json(&ts);
        let list = json["transitions"].as_array().unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list[0]["kind"], "entering");
        assert!(list[0]["from"].is_null());
        assert_eq!(list[0]["owner"]["kind"], "group");

        let snap = snapshot_to_json(s.snapshot().unwrap());
        assert_eq!(snap["measure"], "v");
        assert_eq!(snap["entries"].as_array().unwrap().len(), 4);
    }
}
