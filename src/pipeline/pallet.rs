//! Page sequencing for the PDF: label pages interleaved with pallet summaries.
//!
//! Grouping is positional over the normalised records. After every
//! `pallet_size`-th label a summary page follows, numbered from 1. A trailing
//! group smaller than `pallet_size` gets no summary.

/// One page of the PDF, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePlan {
    /// The label for record `record`.
    Label { record: usize },
    /// Summary for the pallet closed by record `record`; `pallet` is 1-based.
    PalletSummary { record: usize, pallet: usize },
}

/// Lay out `count` label pages and their pallet summaries.
pub fn plan_pages(count: usize, pallet_size: usize) -> Vec<PagePlan> {
    let pallet_size = pallet_size.max(1);
    let mut pages = Vec::with_capacity(count + count / pallet_size);
    let mut pallet = 0;
    for record in 0..count {
        pages.push(PagePlan::Label { record });
        if (record + 1) % pallet_size == 0 {
            pallet += 1;
            pages.push(PagePlan::PalletSummary { record, pallet });
        }
    }
    pages
}

/// Number of complete pallets among `count` records.
pub fn full_pallets(count: usize, pallet_size: usize) -> usize {
    count / pallet_size.max(1)
}

/// Records left over in a trailing partial pallet.
pub fn partial_pallet_records(count: usize, pallet_size: usize) -> usize {
    count % pallet_size.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_follows_every_fourth_label() {
        let pages = plan_pages(4, 4);
        assert_eq!(
            pages,
            vec![
                PagePlan::Label { record: 0 },
                PagePlan::Label { record: 1 },
                PagePlan::Label { record: 2 },
                PagePlan::Label { record: 3 },
                PagePlan::PalletSummary { record: 3, pallet: 1 },
            ]
        );
    }

    #[test]
    fn partial_trailing_group_has_no_summary() {
        let pages = plan_pages(7, 4);
        assert_eq!(pages.len(), 8);
        assert_eq!(pages.last(), Some(&PagePlan::Label { record: 6 }));
        assert_eq!(partial_pallet_records(7, 4), 3);
    }

    #[test]
    fn page_count_is_labels_plus_full_pallets() {
        for n in 0..20 {
            assert_eq!(plan_pages(n, 4).len(), n + n / 4, "n = {n}");
        }
    }

    #[test]
    fn pallets_are_numbered_in_order() {
        let numbers: Vec<usize> = plan_pages(12, 4)
            .into_iter()
            .filter_map(|p| match p {
                PagePlan::PalletSummary { pallet, .. } => Some(pallet),
                PagePlan::Label { .. } => None,
            })
            .collect();
        assert_eq!(numbers, [1, 2, 3]);
    }

    #[test]
    fn custom_pallet_size() {
        assert_eq!(plan_pages(6, 3).len(), 8);
        assert_eq!(full_pallets(6, 3), 2);
        assert_eq!(plan_pages(3, 1).len(), 6);
    }

    #[test]
    fn no_records_no_pages() {
        assert!(plan_pages(0, 4).is_empty());
    }
}
