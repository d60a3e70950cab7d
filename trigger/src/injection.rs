//! # Injection Builder
//!
//! Renders ranked actions into text blocks via the `prompt` crate.
//!
//! Each action becomes: optional timestamp line → title → keyword / synonym lines → body.
//! Constant and triggered blocks are joined separately with the configured separator;
//! with `separate_by_type`, triggered blocks are first grouped under localized category
//! headings. A configured template then receives `{{content}}`, `{{constantContent}}` and
//! `{{triggeredContent}}`.

use trigger_core::{EntryPayload, InjectionAction, InjectionConfig, Locale};

/// Rendered actions and text blocks.
#[derive(Debug)]
pub struct BuiltInjection<P> {
    pub actions: Vec<InjectionAction<P>>,
    pub constant_content: String,
    pub triggered_content: String,
    /// Template output; empty without a template.
    pub rendered: String,
}

/// Formats actions according to an [`InjectionConfig`].
pub struct InjectionBuilder<'a> {
    config: &'a InjectionConfig,
}

impl<'a> InjectionBuilder<'a> {
    pub fn new(config: &'a InjectionConfig) -> Self {
        Self { config }
    }

    /// Renders every action's content and assembles the constant / triggered sections.
    pub fn build<P: EntryPayload>(&self, mut actions: Vec<InjectionAction<P>>) -> BuiltInjection<P> {
        for action in actions.iter_mut() {
            action.content = self.render_action(action);
        }

        let separator = self.config.separator.as_str();
        let constant_content = prompt::join_sections(
            actions
                .iter()
                .filter(|a| a.is_constant())
                .map(|a| a.content.as_str()),
            separator,
        );
        let triggered: Vec<&InjectionAction<P>> =
            actions.iter().filter(|a| !a.is_constant()).collect();
        let triggered_content = if self.config.separate_by_type {
            prompt::format_grouped(&self.group_by_category(&triggered), separator)
        } else {
            prompt::join_sections(triggered.iter().map(|a| a.content.as_str()), separator)
        };

        let rendered = match &self.config.template {
            Some(template) => {
                let all = prompt::join_sections([&constant_content, &triggered_content], separator);
                prompt::apply_template(
                    template,
                    &[
                        (prompt::PLACEHOLDER_CONTENT, all.as_str()),
                        (prompt::PLACEHOLDER_CONSTANT, constant_content.as_str()),
                        (prompt::PLACEHOLDER_TRIGGERED, triggered_content.as_str()),
                    ],
                )
            }
            None => String::new(),
        };

        BuiltInjection {
            actions,
            constant_content,
            triggered_content,
            rendered,
        }
    }

    /// Renders one action's entry as a text block.
    pub fn render_action<P: EntryPayload>(&self, action: &InjectionAction<P>) -> String {
        let entry = &action.entry;
        let timestamp = if self.config.include_timestamp {
            entry
                .timestamp
                .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        } else {
            None
        };
        let title = entry.display_title();

        let mut details = Vec::new();
        if self.config.include_keywords {
            let (keywords_label, synonyms_label) = list_labels(self.config.locale);
            details.extend(prompt::format_list_line(keywords_label, &entry.primary_keys));
            details.extend(prompt::format_list_line(synonyms_label, &entry.secondary_keys));
        }

        prompt::format_entry_block(&prompt::EntryBlock {
            timestamp: timestamp.as_deref(),
            title: &title,
            details,
            body: &entry.content,
        })
    }

    /// Groups rendered triggered blocks by category, in order of first appearance.
    fn group_by_category<P: EntryPayload>(
        &self,
        actions: &[&InjectionAction<P>],
    ) -> Vec<(String, Vec<String>)> {
        let mut groups: Vec<(String, String, Vec<String>)> = Vec::new();
        for action in actions {
            let category = action.entry.category();
            match groups.iter_mut().find(|(c, _, _)| c == category) {
                Some((_, _, blocks)) => blocks.push(action.content.clone()),
                None => groups.push((
                    category.to_string(),
                    action.entry.payload.category_label(self.config.locale),
                    vec![action.content.clone()],
                )),
            }
        }
        groups
            .into_iter()
            .map(|(_, label, blocks)| (label, blocks))
            .collect()
    }
}

fn list_labels(locale: Locale) -> (&'static str, &'static str) {
    match locale {
        Locale::En => ("Keywords", "Synonyms"),
        Locale::Zh => ("关键词", "同义词"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use trigger_core::{MemoryType, RoleMemoryPayload, TriggerEntry, WorldBookPayload};

    fn lore(id: &str, comment: Option<&str>, keys: &[&str], body: &str) -> Arc<TriggerEntry<WorldBookPayload>> {
        let payload = WorldBookPayload {
            comment: comment.map(str::to_string),
            group: None,
        };
        Arc::new(
            TriggerEntry::new(id, body, payload).with_primary_keys(keys.iter().copied()),
        )
    }

    #[test]
    fn renders_title_keywords_and_body() {
        let config = InjectionConfig::default();
        let builder = InjectionBuilder::new(&config);
        let action = InjectionAction::triggered(
            Arc::new(
                TriggerEntry::new("1", "Dragons breathe fire.", WorldBookPayload::with_comment("Dragons"))
                    .with_primary_keys(["dragon"])
                    .with_secondary_keys(["wyrm"]),
            ),
            0.8,
            5,
        );
        assert_eq!(
            builder.render_action(&action),
            "## Dragons\nKeywords: dragon\nSynonyms: wyrm\nDragons breathe fire."
        );
    }

    #[test]
    fn timestamp_line_and_locale() {
        let config = InjectionConfig {
            include_timestamp: true,
            locale: Locale::Zh,
            ..InjectionConfig::default()
        };
        let builder = InjectionBuilder::new(&config);
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
        let entry = TriggerEntry::new("7", "记得生日", WorldBookPayload::default())
            .with_primary_keys(["生日"])
            .with_timestamp(ts);
        let action = InjectionAction::constant(Arc::new(entry));
        assert_eq!(
            builder.render_action(&action),
            "[2024-05-01 10:30]\n## 生日\n关键词: 生日\n记得生日"
        );
    }

    #[test]
    fn sections_are_split_by_kind_and_joined() {
        let config = InjectionConfig {
            include_keywords: false,
            separator: "\n--\n".to_string(),
            ..InjectionConfig::default()
        };
        let builder = InjectionBuilder::new(&config);
        let actions = vec![
            InjectionAction::constant(lore("c", Some("World"), &[], "Always.")),
            InjectionAction::triggered(lore("a", None, &["alpha"], "A."), 0.8, 5),
            InjectionAction::triggered(lore("b", None, &[], "B."), 0.8, 5),
        ];
        let built = builder.build(actions);
        assert_eq!(built.constant_content, "## World\nAlways.");
        assert_eq!(built.triggered_content, "## alpha\nA.\n--\n## entry #b\nB.");
        assert!(built.rendered.is_empty());
        assert!(built.actions.iter().all(|a| !a.content.is_empty()));
    }

    #[test]
    fn separate_by_type_groups_under_labels() {
        let config = InjectionConfig {
            include_keywords: false,
            separate_by_type: true,
            separator: "\n".to_string(),
            ..InjectionConfig::default()
        };
        let builder = InjectionBuilder::new(&config);
        let memory = |id: &str, t: MemoryType| {
            InjectionAction::triggered(
                Arc::new(
                    TriggerEntry::new(id, id.to_uppercase(), RoleMemoryPayload::new(t))
                        .with_primary_keys([id]),
                ),
                0.8,
                5,
            )
        };
        let built = builder.build(vec![
            memory("e1", MemoryType::Event),
            memory("f1", MemoryType::Fact),
            memory("e2", MemoryType::Event),
        ]);
        assert_eq!(
            built.triggered_content,
            "### Events\n\n## e1\nE1\n## e2\nE2\n### Facts\n\n## f1\nF1"
        );
    }

    #[test]
    fn template_receives_placeholders() {
        let config = InjectionConfig {
            include_keywords: false,
            separator: "|".to_string(),
            template: Some("[{{constantContent}}][{{triggeredContent}}][{{content}}]{{unknown}}".to_string()),
            ..InjectionConfig::default()
        };
        let builder = InjectionBuilder::new(&config);
        let built = builder.build(vec![
            InjectionAction::constant(lore("c", Some("C"), &[], "c")),
            InjectionAction::triggered(lore("t", Some("T"), &[], "t"), 0.8, 5),
        ]);
        assert_eq!(built.rendered, "[## C\nc][## T\nt][## C\nc|## T\nt]");
    }

    #[test]
    fn empty_actions_render_empty_sections() {
        let config = InjectionConfig {
            template: Some("{{content}}".to_string()),
            ..InjectionConfig::default()
        };
        let built = InjectionBuilder::new(&config).build(Vec::<InjectionAction<WorldBookPayload>>::new());
        assert!(built.constant_content.is_empty());
        assert!(built.triggered_content.is_empty());
        assert!(built.rendered.is_empty());
    }
}
