//! Unit tests for the record converters and world-book parsing.

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use trigger_core::{EntryPayload, MatchStrategy, MemoryType};

    use crate::converter::ToTriggerEntry;
    use crate::records::{parse_role_memories, parse_world_book, EntryUid, RoleMemoryRecord, WorldBookEntry};

    #[test]
    fn test_convert_world_book_entry() {
        let raw = WorldBookEntry {
            uid: EntryUid::Number(7),
            key: vec!["dragon".to_string()],
            keysecondary: vec!["wyrm".to_string()],
            comment: " Dragons ".to_string(),
            content: "Dragons hoard gold.".to_string(),
            order: 100,
            group: "".to_string(),
            ..WorldBookEntry::default()
        };

        let entry = raw.to_trigger_entry();

        assert_eq!(entry.id, "7");
        assert_eq!(entry.primary_keys, vec!["dragon"]);
        assert_eq!(entry.secondary_keys, vec!["wyrm"]);
        assert_eq!(entry.priority, 100);
        assert_eq!(entry.weight, 1.0);
        assert!(!entry.is_constant);
        assert_eq!(entry.payload.comment.as_deref(), Some("Dragons"));
        assert_eq!(entry.payload.group, None);
        assert_eq!(entry.category(), "lore");
        assert!(raw.is_enabled());
    }

    #[test]
    fn test_disabled_world_book_entry() {
        let raw = WorldBookEntry {
            disable: true,
            ..WorldBookEntry::default()
        };
        assert!(!raw.is_enabled());
    }

    #[test]
    fn test_convert_role_memory() {
        let now = Utc::now();
        let raw = RoleMemoryRecord {
            id: "m1".to_string(),
            memory_type: MemoryType::Preference,
            keywords: vec!["tea".to_string()],
            synonyms: vec![],
            content: "Prefers green tea.".to_string(),
            priority: 3,
            is_constant: false,
            enabled: true,
            timestamp: Some(now),
            emotional_context: Some("calm".to_string()),
            emotional_weight: Some(0.6),
            time_decay_factor: None,
            related_topics: vec!["drinks".to_string()],
            weight: Some(1.5),
            malformed: None,
        };

        let entry = raw.to_trigger_entry();

        assert_eq!(entry.payload.category(), "preference");
        assert_eq!(entry.priority, 3);
        assert_eq!(entry.weight, 1.5);
        assert_eq!(entry.timestamp, Some(now));
        assert_eq!(entry.emotional_context.as_deref(), Some("calm"));
        assert_eq!(entry.related_topics, vec!["drinks"]);
    }

    #[test]
    fn test_parse_world_book_map_layout() {
        let json = r#"{
            "entries": {
                "10": {"uid": 10, "key": ["elf"], "content": "Elves.", "order": 5},
                "2": {"uid": 2, "key": "orc, goblin ,", "content": "Orcs.", "constant": true},
                "3": {"uid": 3, "content": "Off.", "disable": true}
            }
        }"#;

        let entries = parse_world_book(json).unwrap();

        let uids: Vec<String> = entries.iter().map(|e| e.uid.to_string()).collect();
        assert_eq!(uids, vec!["2", "3", "10"]);
        assert_eq!(entries[0].key, vec!["orc", "goblin"]);
        assert!(entries[0].constant);
        assert!(entries[1].disable);
        assert_eq!(entries[2].order, 5);
    }

    #[test]
    fn test_parse_world_book_array_layouts() {
        let bare = r#"[{"uid": "a", "key": ["x"], "content": "X", "priority": 4, "match_strategy": "fuzzy"}]"#;
        let wrapped = r#"{"entries": [{"uid": "a", "key": ["x"], "content": "X", "priority": 4, "match_strategy": "fuzzy"}]}"#;

        let bare = parse_world_book(bare).unwrap();
        let wrapped = parse_world_book(wrapped).unwrap();

        assert_eq!(bare, wrapped);
        assert_eq!(bare[0].uid, EntryUid::Text("a".to_string()));
        assert_eq!(bare[0].order, 4);
        assert_eq!(bare[0].to_trigger_entry().match_strategy, Some(MatchStrategy::Fuzzy));
    }

    #[test]
    fn test_parse_invalid_world_book() {
        assert!(parse_world_book("{\"entries\": 3}").is_err());
        assert!(parse_world_book("not json").is_err());
    }

    #[test]
    fn test_malformed_entry_is_kept_unmatchable() {
        let json = r#"[
            {"uid": 1, "key": ["elf"], "content": "Elves."},
            {"uid": 2, "key": ["storm"], "content": "Storms.", "constant": true,
             "context_requirements": [{"type": "weather", "value": "rain"}]},
            {"uid": 3, "key": ["orc"], "content": "Orcs.", "order": "high"}
        ]"#;

        let entries = parse_world_book(json).unwrap();

        assert_eq!(entries.len(), 3);
        assert!(entries[0].malformed.is_none());
        assert!(entries[1].malformed.is_some());
        assert!(entries[1].constant);
        assert_eq!(entries[1].content, "Storms.");
        assert!(entries[2].malformed.is_some());

        let storm = entries[1].to_trigger_entry();
        assert_eq!(storm.id, "2");
        assert!(storm.is_constant);
        assert!(!storm.is_matchable());
        assert!(!entries[2].to_trigger_entry().is_matchable());
    }

    #[test]
    fn test_malformed_role_memory_is_kept_unmatchable() {
        let json = r#"[{"id": "m", "content": "Likes rain.", "keywords": ["rain"], "priority": "top"}]"#;

        let records = parse_role_memories(json).unwrap();

        assert!(records[0].malformed.is_some());
        assert!(records[0].enabled);
        assert!(!records[0].to_trigger_entry().is_matchable());
        assert!(parse_role_memories(r#"{"id": "m"}"#).is_err());
    }

    #[test]
    fn test_parse_role_memories_defaults() {
        let json = r#"[{"id": "m", "content": "Likes rain.", "keywords": ["rain"], "importance": 2, "memory_type": "mood"}]"#;

        let records = parse_role_memories(json).unwrap();

        assert_eq!(records[0].priority, 2);
        assert!(records[0].enabled);
        assert_eq!(records[0].memory_type, MemoryType::Other);
    }
}
