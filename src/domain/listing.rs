//! Display-ready views over an equipment collection
//!
//! Everything here borrows the source slice and returns references into it;
//! the collection itself is never reordered or modified. The functions are
//! generic over anything that exposes an [`EquipmentRecord`], so they work on
//! plain records and on entities alike.

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use unicode_normalization::{char::canonical_combining_class, UnicodeNormalization};

use super::entity::{
    can_be_borrowed, can_be_deleted, can_be_edited, can_be_returned, has_borrower,
    has_consistent_data, EquipmentEntity,
};
use crate::models::{EquipmentCategory, EquipmentRecord, EquipmentStatus};

impl AsRef<EquipmentRecord> for EquipmentRecord {
    fn as_ref(&self) -> &EquipmentRecord {
        self
    }
}

impl AsRef<EquipmentRecord> for EquipmentEntity {
    fn as_ref(&self) -> &EquipmentRecord {
        self.record()
    }
}

/// Active list filters. Unset fields and an empty query do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub category: Option<EquipmentCategory>,
    pub status: Option<EquipmentStatus>,
    #[serde(default)]
    pub query: String,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.status.is_none() && self.query.trim().is_empty()
    }

    /// Exact-match category/status check (the query is not considered)
    pub fn matches_filters(&self, record: &EquipmentRecord) -> bool {
        self.category.map_or(true, |c| record.category == c)
            && self.status.map_or(true, |s| record.status == s)
    }

    pub fn matches(&self, record: &EquipmentRecord) -> bool {
        self.matches_filters(record) && matches_query(record, &self.query)
    }
}

// ---------------------------------------------------------------------------
// Text folding
// ---------------------------------------------------------------------------

/// Width- and case-fold text (NFKC over the whole string, then lowercase)
fn fold(text: &str) -> String {
    text.nfkc().flat_map(char::to_lowercase).collect()
}

/// Marks that compose with the preceding character under NFKC, including the
/// half-width voiced sound marks
fn joins_previous(c: char) -> bool {
    matches!(c, '\u{FF9E}' | '\u{FF9F}') || canonical_combining_class(c) != 0
}

/// Byte ranges of base-plus-marks runs; each run folds independently
fn fold_runs(text: &str) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for (offset, c) in text.char_indices() {
        let end = offset + c.len_utf8();
        if !runs.is_empty() && joins_previous(c) {
            if let Some(run) = runs.last_mut() {
                run.1 = end;
            }
        } else {
            runs.push((offset, end));
        }
    }
    runs
}

/// Katakana sort together with the matching hiragana
fn kana_fold(c: char) -> char {
    match c {
        '\u{30A1}'..='\u{30F6}' | '\u{30FD}'..='\u{30FE}' => {
            char::from_u32(c as u32 - 0x60).unwrap_or(c)
        }
        _ => c,
    }
}

fn name_sort_key(name: &str) -> String {
    fold(name).chars().map(kana_fold).collect()
}

// ---------------------------------------------------------------------------
// Filter, search, sort
// ---------------------------------------------------------------------------

/// Keep the items whose category and status match the criteria
pub fn filter_records<'a, T: AsRef<EquipmentRecord>>(
    items: &'a [T],
    criteria: &FilterCriteria,
) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| criteria.matches_filters(item.as_ref()))
        .collect()
}

/// Case-insensitive substring match on any text field
pub fn matches_query(record: &EquipmentRecord, query: &str) -> bool {
    let needle = fold(query.trim());
    if needle.is_empty() {
        return true;
    }
    [
        Some(record.name.as_str()),
        Some(record.category.label()),
        Some(record.status.label()),
        Some(record.storage_location.as_str()),
        record.borrower.as_deref(),
        record.notes.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| fold(field).contains(&needle))
}

pub fn search_records<'a, T: AsRef<EquipmentRecord>>(items: &'a [T], query: &str) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| matches_query(item.as_ref(), query))
        .collect()
}

/// Japanese-aware name ordering: width, case and kana type are ignored first,
/// then the raw strings break the tie.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    name_sort_key(a)
        .cmp(&name_sort_key(b))
        .then_with(|| a.cmp(b))
}

/// Stable ascending sort by name; equal names keep their relative order
pub fn sort_by_name<T: AsRef<EquipmentRecord>>(items: &mut [&T]) {
    items.sort_by_cached_key(|item| {
        let record: &EquipmentRecord = (*item).as_ref();
        (name_sort_key(&record.name), record.name.clone())
    });
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Number of records per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub in_use: usize,
    pub on_loan: usize,
    pub available: usize,
    pub disposed: usize,
}

impl StatusCounts {
    pub fn count(&self, status: EquipmentStatus) -> usize {
        match status {
            EquipmentStatus::InUse => self.in_use,
            EquipmentStatus::OnLoan => self.on_loan,
            EquipmentStatus::Available => self.available,
            EquipmentStatus::Disposed => self.disposed,
        }
    }

    fn add(&mut self, status: EquipmentStatus) {
        match status {
            EquipmentStatus::InUse => self.in_use += 1,
            EquipmentStatus::OnLoan => self.on_loan += 1,
            EquipmentStatus::Available => self.available += 1,
            EquipmentStatus::Disposed => self.disposed += 1,
        }
    }

    fn tally<'a>(records: impl IntoIterator<Item = &'a EquipmentRecord>) -> Self {
        let mut counts = Self::default();
        for record in records {
            counts.add(record.status);
        }
        counts
    }
}

/// Aggregate counts for the list header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventoryStats {
    /// Size of the whole collection
    pub total: usize,
    /// Size after filters and search
    pub filtered: usize,
    /// Status counts over the whole collection
    pub by_status: StatusCounts,
}

pub fn statistics<T: AsRef<EquipmentRecord>>(items: &[T], filtered: usize) -> InventoryStats {
    InventoryStats {
        total: items.len(),
        filtered,
        by_status: StatusCounts::tally(items.iter().map(AsRef::as_ref)),
    }
}

/// Filtered, searched and sorted items plus their statistics
#[derive(Debug, Clone)]
pub struct ListView<'a, T> {
    pub items: Vec<&'a T>,
    pub stats: InventoryStats,
}

/// Full list pipeline: filter, search, sort by name, count
pub fn derive_view<'a, T: AsRef<EquipmentRecord>>(
    items: &'a [T],
    criteria: &FilterCriteria,
) -> ListView<'a, T> {
    let mut visible: Vec<&T> = items
        .iter()
        .filter(|item| criteria.matches(item.as_ref()))
        .collect();
    sort_by_name(&mut visible);
    let stats = statistics(items, visible.len());
    ListView {
        items: visible,
        stats,
    }
}

// ---------------------------------------------------------------------------
// Highlighting
// ---------------------------------------------------------------------------

/// A run of text, either matching the search query or not
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub matched: bool,
}

impl<'a> Segment<'a> {
    fn plain(text: &'a str) -> Self {
        Self { text, matched: false }
    }

    fn matched(text: &'a str) -> Self {
        Self { text, matched: true }
    }
}

/// Split `text` into matched and plain runs for `query`, using the same
/// folding as search. Concatenating the segments yields `text` unchanged.
pub fn highlight<'a>(text: &'a str, query: &str) -> Vec<Segment<'a>> {
    let needle = fold(query.trim());
    if text.is_empty() {
        return Vec::new();
    }
    if needle.is_empty() {
        return vec![Segment::plain(text)];
    }

    // (offset in folded text, offset in original text) per source run
    let mut folded = String::with_capacity(text.len());
    let mut bounds: Vec<(usize, usize)> = Vec::new();
    for (start, end) in fold_runs(text) {
        bounds.push((folded.len(), start));
        folded.push_str(&fold(&text[start..end]));
    }

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for (start, found) in folded.match_indices(needle.as_str()) {
        let end = start + found.len();
        let first = bounds.partition_point(|(f, _)| *f <= start).saturating_sub(1);
        let orig_start = bounds[first].1;
        let orig_end = bounds
            .iter()
            .find(|(f, _)| *f >= end)
            .map_or(text.len(), |(_, o)| *o);
        let overlaps = ranges.last().is_some_and(|last| last.1 >= orig_start);
        if overlaps {
            if let Some(last) = ranges.last_mut() {
                last.1 = last.1.max(orig_end);
            }
        } else if orig_start < orig_end {
            ranges.push((orig_start, orig_end));
        }
    }

    let mut segments = Vec::with_capacity(ranges.len() * 2 + 1);
    let mut cursor = 0;
    for (start, end) in ranges {
        if start > cursor {
            segments.push(Segment::plain(&text[cursor..start]));
        }
        segments.push(Segment::matched(&text[start..end]));
        cursor = end;
    }
    if cursor < text.len() {
        segments.push(Segment::plain(&text[cursor..]));
    }
    segments
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

/// Business-rule breakdown of a collection
#[derive(Debug, Clone)]
pub struct InventoryInsights<'a, T> {
    pub deletable: Vec<&'a T>,
    pub borrowable: Vec<&'a T>,
    pub returnable: Vec<&'a T>,
    pub editable: Vec<&'a T>,
    pub inconsistent: Vec<&'a T>,
    pub status_summary: StatusCounts,
    /// Counts for the categories present, in category order
    pub category_summary: IndexMap<EquipmentCategory, usize>,
    pub total: usize,
}

impl<'a, T> InventoryInsights<'a, T> {
    /// In-use plus on-loan over total, in percent
    pub fn utilization_rate(&self) -> f64 {
        percent(
            self.status_summary.in_use + self.status_summary.on_loan,
            self.total,
        )
    }

    /// Inconsistent records over total, in percent
    pub fn issue_rate(&self) -> f64 {
        percent(self.inconsistent.len(), self.total)
    }

    /// `(category, count, percent of total)` for each category present
    pub fn category_shares(&self) -> Vec<(EquipmentCategory, usize, f64)> {
        self.category_summary
            .iter()
            .map(|(category, count)| (*category, *count, percent(*count, self.total)))
            .collect()
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn select<'a, T: AsRef<EquipmentRecord>>(
    items: &'a [T],
    rule: impl Fn(&EquipmentRecord) -> bool,
) -> Vec<&'a T> {
    items.iter().filter(|item| rule(item.as_ref())).collect()
}

pub fn insights<T: AsRef<EquipmentRecord>>(items: &[T]) -> InventoryInsights<'_, T> {
    let mut category_summary: IndexMap<EquipmentCategory, usize> = EquipmentCategory::ALL
        .into_iter()
        .map(|c| (c, 0))
        .collect();
    for item in items {
        let record: &EquipmentRecord = item.as_ref();
        *category_summary.entry(record.category).or_insert(0) += 1;
    }
    category_summary.retain(|_, count| *count > 0);

    InventoryInsights {
        deletable: select(items, can_be_deleted),
        borrowable: select(items, can_be_borrowed),
        returnable: select(items, can_be_returned),
        editable: select(items, can_be_edited),
        inconsistent: select(items, |r| !has_consistent_data(r)),
        status_summary: StatusCounts::tally(items.iter().map(AsRef::as_ref)),
        category_summary,
        total: items.len(),
    }
}

/// Records whose data needs attention
#[derive(Debug, Clone)]
pub struct IntegrityReport<'a, T> {
    pub inconsistent: Vec<&'a T>,
    /// A borrower is set but the item is neither on loan nor in use
    pub borrower_without_loan: Vec<&'a T>,
    /// On loan without a borrower
    pub loan_without_borrower: Vec<&'a T>,
    pub empty_stock: Vec<&'a T>,
}

impl<'a, T> IntegrityReport<'a, T> {
    pub fn total_issues(&self) -> usize {
        self.inconsistent.len() + self.empty_stock.len()
    }

    pub fn has_issues(&self) -> bool {
        self.total_issues() > 0
    }
}

pub fn integrity_report<T: AsRef<EquipmentRecord>>(items: &[T]) -> IntegrityReport<'_, T> {
    IntegrityReport {
        inconsistent: select(items, |r| !has_consistent_data(r)),
        borrower_without_loan: select(items, |r| {
            has_borrower(r.borrower.as_deref())
                && !matches!(r.status, EquipmentStatus::OnLoan | EquipmentStatus::InUse)
        }),
        loan_without_borrower: select(items, |r| {
            r.status == EquipmentStatus::OnLoan && !has_borrower(r.borrower.as_deref())
        }),
        empty_stock: select(items, |r| r.quantity == 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, status: EquipmentStatus, borrower: Option<&str>) -> EquipmentRecord {
        EquipmentRecord {
            id: id.to_string(),
            name: name.to_string(),
            category: EquipmentCategory::Electronics,
            status,
            quantity: 1,
            storage_location: "倉庫A".to_string(),
            purchase_date: "2024-01-01".to_string(),
            borrower: borrower.map(str::to_string),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            notes: None,
        }
    }

    fn ids<T: AsRef<EquipmentRecord>>(items: &[&T]) -> Vec<String> {
        items
            .iter()
            .map(|i| {
                let record: &EquipmentRecord = (*i).as_ref();
                record.id.clone()
            })
            .collect()
    }

    #[test]
    fn test_search_is_case_and_width_insensitive() {
        let items = vec![
            record("1", "Laptop", EquipmentStatus::Available, None),
            record("2", "Chair", EquipmentStatus::OnLoan, Some("Suzuki")),
        ];
        assert_eq!(ids(&search_records(&items, "suzuki")), vec!["2"]);
        assert_eq!(ids(&search_records(&items, "ＬＡＰ")), vec!["1"]);
        assert_eq!(ids(&search_records(&items, "貸出")), vec!["2"]);
        assert_eq!(ids(&search_records(&items, "  ")), vec!["1", "2"]);
        assert!(search_records(&items, "projector").is_empty());
    }

    #[test]
    fn test_search_composes_half_width_voiced_marks() {
        let half = record("1", "ｶﾞｽボンベ", EquipmentStatus::Available, None);
        let full = record("2", "ガスボンベ", EquipmentStatus::Available, None);
        assert!(matches_query(&half, "ガス"));
        assert!(matches_query(&full, "ｶﾞｽ"));
        assert!(matches_query(&full, "ﾎﾞﾝﾍﾞ"));
        assert!(!matches_query(&half, "カス"));
        assert_eq!(name_sort_key("ｶﾞｽ"), name_sort_key("がす"));
    }

    #[test]
    fn test_search_covers_notes_and_location() {
        let mut item = record("1", "Tripod", EquipmentStatus::InUse, None);
        item.notes = Some("Spare legs in box".to_string());
        assert!(matches_query(&item, "LEGS"));
        assert!(matches_query(&item, "倉庫"));
        assert!(matches_query(&item, "電子"));
    }

    #[test]
    fn test_filters_commute() {
        let mut items = vec![
            record("1", "A", EquipmentStatus::Available, None),
            record("2", "B", EquipmentStatus::OnLoan, Some("x")),
            record("3", "C", EquipmentStatus::Available, None),
        ];
        items[2].category = EquipmentCategory::Tools;

        let by_category = FilterCriteria {
            category: Some(EquipmentCategory::Electronics),
            ..Default::default()
        };
        let by_status = FilterCriteria {
            status: Some(EquipmentStatus::Available),
            ..Default::default()
        };

        let first: Vec<EquipmentRecord> =
            filter_records(&items, &by_category).into_iter().cloned().collect();
        let category_then_status = ids(&filter_records(&first, &by_status));

        let first: Vec<EquipmentRecord> =
            filter_records(&items, &by_status).into_iter().cloned().collect();
        let status_then_category = ids(&filter_records(&first, &by_category));

        assert_eq!(category_then_status, vec!["1"]);
        assert_eq!(category_then_status, status_then_category);
        assert_eq!(filter_records(&items, &FilterCriteria::default()).len(), 3);
    }

    #[test]
    fn test_sort_is_stable_and_idempotent() {
        let items = vec![
            record("1", "プロジェクター", EquipmentStatus::Available, None),
            record("2", "いす", EquipmentStatus::Available, None),
            record("3", "Camera", EquipmentStatus::Available, None),
            record("4", "いす", EquipmentStatus::Available, None),
            record("5", "camera", EquipmentStatus::Available, None),
        ];
        let mut view: Vec<&EquipmentRecord> = items.iter().collect();
        sort_by_name(&mut view);
        let once = ids(&view);
        assert_eq!(once, vec!["3", "5", "2", "4", "1"]);

        sort_by_name(&mut view);
        assert_eq!(ids(&view), once);
    }

    #[test]
    fn test_compare_names_folds_kana_and_width() {
        // same key, raw code points break the tie
        assert_eq!(compare_names("かめら", "カメラ"), Ordering::Less);
        assert_eq!(compare_names("いす", "カメラ"), Ordering::Less);
        assert_eq!(compare_names("ｶﾒﾗ", "テレビ"), Ordering::Less);
        assert_eq!(compare_names("abc", "ABD"), Ordering::Less);
    }

    #[test]
    fn test_statistics_count_whole_collection() {
        let items = vec![
            record("1", "Laptop", EquipmentStatus::Available, None),
            record("2", "Chair", EquipmentStatus::OnLoan, Some("Suzuki")),
            record("3", "Desk", EquipmentStatus::Disposed, None),
        ];
        let view = derive_view(
            &items,
            &FilterCriteria {
                status: Some(EquipmentStatus::OnLoan),
                ..Default::default()
            },
        );
        assert_eq!(ids(&view.items), vec!["2"]);
        assert_eq!(view.stats.total, 3);
        assert_eq!(view.stats.filtered, 1);
        assert_eq!(view.stats.by_status.available, 1);
        assert_eq!(view.stats.by_status.count(EquipmentStatus::Disposed), 1);
        assert_eq!(view.stats.by_status.in_use, 0);
    }

    #[test]
    fn test_derive_view_does_not_touch_source() {
        let items = vec![
            record("1", "b", EquipmentStatus::Available, None),
            record("2", "a", EquipmentStatus::Available, None),
        ];
        let view = derive_view(&items, &FilterCriteria::default());
        assert_eq!(ids(&view.items), vec!["2", "1"]);
        assert_eq!(items[0].id, "1");
    }

    #[test]
    fn test_highlight_segments() {
        let segments = highlight("Sony Camera sony", "SONY");
        assert_eq!(
            segments,
            vec![
                Segment::matched("Sony"),
                Segment::plain(" Camera "),
                Segment::matched("sony"),
            ]
        );
        let joined: String = segments.iter().map(|s| s.text).collect();
        assert_eq!(joined, "Sony Camera sony");
    }

    #[test]
    fn test_highlight_full_width_text() {
        let segments = highlight("ＭａｃＢｏｏｋノート", "macbook");
        assert_eq!(
            segments,
            vec![Segment::matched("ＭａｃＢｏｏｋ"), Segment::plain("ノート")]
        );
    }

    #[test]
    fn test_highlight_half_width_kana() {
        assert_eq!(
            highlight("ｶﾞｽボンベ", "ガス"),
            vec![Segment::matched("ｶﾞｽ"), Segment::plain("ボンベ")]
        );
        assert_eq!(
            highlight("ガスボンベ", "ﾎﾞﾝ"),
            vec![
                Segment::plain("ガス"),
                Segment::matched("ボン"),
                Segment::plain("ベ"),
            ]
        );
    }

    #[test]
    fn test_highlight_without_match_or_query() {
        assert_eq!(highlight("Chair", "desk"), vec![Segment::plain("Chair")]);
        assert_eq!(highlight("Chair", ""), vec![Segment::plain("Chair")]);
        assert!(highlight("", "desk").is_empty());
        assert_eq!(highlight("aaa", "a"), vec![Segment::matched("aaa")]);
    }

    #[test]
    fn test_insights() {
        let mut items = vec![
            EquipmentEntity::from_record(record("1", "A", EquipmentStatus::Available, None)),
            EquipmentEntity::from_record(record("2", "B", EquipmentStatus::OnLoan, None)),
            EquipmentEntity::from_record(record("3", "C", EquipmentStatus::InUse, None)),
            EquipmentEntity::from_record(record("4", "D", EquipmentStatus::Disposed, None)),
        ];
        let mut tools = items[3].to_record();
        tools.category = EquipmentCategory::Tools;
        items[3] = EquipmentEntity::from_record(tools);

        let summary = insights(&items);
        assert_eq!(summary.deletable.len(), 3);
        assert_eq!(summary.borrowable.len(), 1);
        assert_eq!(summary.returnable.len(), 1);
        assert_eq!(summary.editable.len(), 3);
        assert_eq!(summary.inconsistent.len(), 1);
        assert_eq!(summary.utilization_rate(), 50.0);
        assert_eq!(summary.issue_rate(), 25.0);
        assert_eq!(
            summary.category_shares(),
            vec![
                (EquipmentCategory::Electronics, 3, 75.0),
                (EquipmentCategory::Tools, 1, 25.0),
            ]
        );

        let empty: Vec<EquipmentRecord> = Vec::new();
        assert_eq!(insights(&empty).utilization_rate(), 0.0);
    }

    #[test]
    fn test_integrity_report() {
        let mut empty_stock = record("4", "D", EquipmentStatus::Available, None);
        empty_stock.quantity = 0;
        let items = vec![
            record("1", "A", EquipmentStatus::Available, Some("山田")),
            record("2", "B", EquipmentStatus::OnLoan, Some(" ")),
            record("3", "C", EquipmentStatus::InUse, Some("佐藤")),
            empty_stock,
        ];
        let report = integrity_report(&items);
        assert_eq!(ids(&report.borrower_without_loan), vec!["1"]);
        assert_eq!(ids(&report.loan_without_borrower), vec!["2"]);
        assert_eq!(ids(&report.inconsistent), vec!["2"]);
        assert_eq!(ids(&report.empty_stock), vec!["4"]);
        assert_eq!(report.total_issues(), 2);
        assert!(report.has_issues());
    }
}
