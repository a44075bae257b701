//! Filtering, sorting and paging for the stock table widget.

use crate::api::types::StockQuote;
use std::cmp::Ordering;
use std::str::FromStr;

pub const PAGE_SIZE: usize = 5;

const COMPANY_NAMES: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("GOOGL", "Alphabet Inc."),
    ("MSFT", "Microsoft Corp."),
    ("AMZN", "Amazon.com Inc."),
    ("TSLA", "Tesla Inc."),
    ("META", "Meta Platforms Inc."),
    ("NVDA", "NVIDIA Corp."),
    ("AMD", "Advanced Micro Devices"),
    ("NFLX", "Netflix Inc."),
    ("CRM", "Salesforce Inc."),
];

/// Display name for a ticker; unknown symbols become `<SYM> Corp.`.
pub fn company_name(symbol: &str) -> String {
    COMPANY_NAMES
        .iter()
        .find(|(sym, _)| sym.eq_ignore_ascii_case(symbol))
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("{} Corp.", symbol))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Symbol,
    Price,
    ChangePercent,
    Volume,
}

impl SortKey {
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Symbol => "Symbol",
            SortKey::Price => "Price",
            SortKey::ChangePercent => "Change",
            SortKey::Volume => "Volume",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "symbol" | "sym" => Ok(SortKey::Symbol),
            "price" => Ok(SortKey::Price),
            "change" | "changepercent" | "pct" => Ok(SortKey::ChangePercent),
            "volume" | "vol" => Ok(SortKey::Volume),
            other => Err(format!("cannot sort by '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMove {
    Next,
    Prev,
    /// 1-based page number.
    To(usize),
}

/// View state of one table widget. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub filter: String,
    pub sort: SortKey,
    pub dir: SortDir,
    /// 0-based.
    pub page: usize,
}

impl Default for TableView {
    fn default() -> Self {
        Self {
            filter: String::new(),
            sort: SortKey::Symbol,
            dir: SortDir::Asc,
            page: 0,
        }
    }
}

/// One rendered page.
#[derive(Debug)]
pub struct TablePage<'a> {
    pub rows: Vec<&'a StockQuote>,
    pub page: usize,
    pub total_pages: usize,
    pub matched: usize,
}

impl TableView {
    /// Sorting by the current key flips direction; a new key starts ascending.
    pub fn sort_by(&mut self, key: SortKey) {
        if key == self.sort {
            self.dir = match self.dir {
                SortDir::Asc => SortDir::Desc,
                SortDir::Desc => SortDir::Asc,
            };
        } else {
            self.sort = key;
            self.dir = SortDir::Asc;
        }
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
        self.page = 0;
    }

    pub fn turn_page(&mut self, step: PageMove, total_pages: usize) {
        let last = total_pages.saturating_sub(1);
        self.page = match step {
            PageMove::Next => (self.page + 1).min(last),
            PageMove::Prev => self.page.saturating_sub(1),
            PageMove::To(n) => n.saturating_sub(1).min(last),
        };
    }

    fn matches(&self, quote: &StockQuote) -> bool {
        if self.filter.is_empty() {
            return true;
        }
        let needle = self.filter.to_lowercase();
        quote.symbol.to_lowercase().contains(&needle)
            || company_name(&quote.symbol).to_lowercase().contains(&needle)
    }

    fn compare(&self, a: &StockQuote, b: &StockQuote) -> Ordering {
        let ord = match self.sort {
            SortKey::Symbol => a.symbol.cmp(&b.symbol),
            SortKey::Price => a.price.total_cmp(&b.price),
            SortKey::ChangePercent => a.change_percent.total_cmp(&b.change_percent),
            SortKey::Volume => a.volume.cmp(&b.volume),
        };
        match self.dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    }

    /// Filter, sort and slice `quotes`. The page index is clamped when the
    /// filter shrinks the result set.
    pub fn arrange<'a>(&self, quotes: &'a [StockQuote]) -> TablePage<'a> {
        let mut rows: Vec<&StockQuote> = quotes.iter().filter(|q| self.matches(q)).collect();
        rows.sort_by(|a, b| self.compare(a, b));

        let matched = rows.len();
        let total_pages = matched.div_ceil(PAGE_SIZE).max(1);
        let page = self.page.min(total_pages - 1);
        let rows = rows.into_iter().skip(page * PAGE_SIZE).take(PAGE_SIZE).collect();

        TablePage {
            rows,
            page,
            total_pages,
            matched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(symbol: &str, price: f64, pct: f64, volume: u64) -> StockQuote {
        StockQuote {
            symbol: symbol.into(),
            price,
            change: 0.0,
            change_percent: pct,
            volume,
            market_cap: None,
            pe: None,
            high: None,
            low: None,
            open: None,
            previous_close: None,
        }
    }

    fn sample() -> Vec<StockQuote> {
        vec![
            quote("TSLA", 250.0, -2.0, 900),
            quote("AAPL", 190.0, 1.5, 500),
            quote("MSFT", 410.0, 0.2, 700),
            quote("AMZN", 180.0, 3.1, 300),
            quote("GOOGL", 140.0, -0.4, 100),
            quote("META", 480.0, 2.2, 800),
            quote("NVDA", 900.0, 4.0, 600),
        ]
    }

    fn symbols(page: &TablePage<'_>) -> Vec<String> {
        page.rows.iter().map(|q| q.symbol.clone()).collect()
    }

    #[test]
    fn test_default_sort_and_paging() {
        let quotes = sample();
        let mut view = TableView::default();
        let first = view.arrange(&quotes);
        assert_eq!(first.total_pages, 2);
        assert_eq!(symbols(&first), vec!["AAPL", "AMZN", "GOOGL", "META", "MSFT"]);

        view.turn_page(PageMove::Next, first.total_pages);
        let second = view.arrange(&quotes);
        assert_eq!(symbols(&second), vec!["NVDA", "TSLA"]);

        view.turn_page(PageMove::Next, second.total_pages);
        assert_eq!(view.page, 1);
    }

    #[test]
    fn test_sort_toggles_direction() {
        let quotes = sample();
        let mut view = TableView::default();
        view.sort_by(SortKey::Price);
        assert_eq!(view.arrange(&quotes).rows[0].symbol, "GOOGL");
        view.sort_by(SortKey::Price);
        assert_eq!(view.dir, SortDir::Desc);
        assert_eq!(view.arrange(&quotes).rows[0].symbol, "NVDA");
        view.sort_by(SortKey::Volume);
        assert_eq!(view.dir, SortDir::Asc);
    }

    #[test]
    fn test_filter_matches_symbol_or_name() {
        let quotes = sample();
        let mut view = TableView::default();
        view.turn_page(PageMove::To(2), 2);
        view.set_filter("inc");
        let page = view.arrange(&quotes);
        assert_eq!(page.page, 0);
        // TSLA, AAPL, AMZN, GOOGL, META; the Corp. names do not match
        assert_eq!(page.matched, 5);
        view.set_filter("nv");
        assert_eq!(symbols(&view.arrange(&quotes)), vec!["NVDA"]);
    }

    #[test]
    fn test_empty_table_has_one_page() {
        let view = TableView {
            page: 3,
            ..Default::default()
        };
        let page = view.arrange(&[]);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 0);
        assert!(page.rows.is_empty());
    }

    #[test]
    fn test_company_names() {
        assert_eq!(company_name("aapl"), "Apple Inc.");
        assert_eq!(company_name("ZZZ"), "ZZZ Corp.");
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("Change".parse::<SortKey>().unwrap(), SortKey::ChangePercent);
        assert!("pe".parse::<SortKey>().is_err());
    }
}
