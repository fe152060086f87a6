//! Client-side product list handling: search, category filter, sort, paging.

use core::str::FromStr;
use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tooldepot_core::{CategoryId, Product};

/// Largest page size a caller may request.
pub const MAX_PER_PAGE: usize = 100;
/// Page size used when none is given.
pub const DEFAULT_PER_PAGE: usize = 12;

/// Product list ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    /// Most recently created first; undated products last.
    #[default]
    Newest,
    NameAsc,
    NameDesc,
    /// By lowest variant price, cheapest first.
    PriceAsc,
    PriceDesc,
}

impl FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "name_asc" | "name" => Ok(Self::NameAsc),
            "name_desc" => Ok(Self::NameDesc),
            "price_asc" | "price" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            _ => Err(format!("invalid sort: {s}")),
        }
    }
}

/// Filter, sort, and page parameters for the product browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    /// Case-insensitive match against name, brand, or any variant SKU.
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    pub sort: ProductSort,
    /// 1-based; 0 is treated as 1.
    pub page: usize,
    /// Clamped to `1..=MAX_PER_PAGE`.
    pub per_page: usize,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            sort: ProductSort::default(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: Vec<&'a T>,
    pub page: usize,
    pub per_page: usize,
    /// Matches across all pages.
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<'_, T> {
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }
}

impl ProductQuery {
    /// Whether `product` passes the search and category filters.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category
            && product.category.as_ref() != Some(category)
        {
            return false;
        }

        let Some(needle) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
        else {
            return true;
        };
        let needle = needle.to_lowercase();

        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);
        contains(&product.name)
            || product.brand.as_deref().is_some_and(contains)
            || product
                .variants
                .iter()
                .filter_map(|variant| variant.sku.as_deref())
                .any(contains)
    }

    /// Filter, sort, and slice `products` into the requested page.
    ///
    /// A page past the end is empty but still reports the true totals.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Page<'a, Product> {
        let mut matching: Vec<&Product> = products.iter().filter(|p| self.matches(p)).collect();
        matching.sort_by(|a, b| compare(self.sort, a, b));

        let per_page = self.per_page.clamp(1, MAX_PER_PAGE);
        let page = self.page.max(1);
        let total = matching.len();
        let total_pages = total.div_ceil(per_page);

        let items = matching
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();

        Page {
            items,
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

fn compare(sort: ProductSort, a: &Product, b: &Product) -> Ordering {
    let by_name = || a.name.to_lowercase().cmp(&b.name.to_lowercase());
    // Products without variants have no price and sort last either way
    let price = |p: &Product| p.lowest_price().unwrap_or(Decimal::MAX);

    match sort {
        ProductSort::Newest => b
            .created_at
            .cmp(&a.created_at)
            .then_with(by_name),
        ProductSort::NameAsc => by_name(),
        ProductSort::NameDesc => by_name().reverse(),
        ProductSort::PriceAsc => price(a).cmp(&price(b)).then_with(by_name),
        ProductSort::PriceDesc => match (a.lowest_price(), b.lowest_price()) {
            (Some(x), Some(y)) => y.cmp(&x).then_with(by_name),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => by_name(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Product> {
        serde_json::from_value(serde_json::json!([
            {
                "_id": "p1", "name": "Claw Hammer", "brand": "Stanley", "category": "hand",
                "createdAt": "2024-03-01T00:00:00Z",
                "variants": [{ "_id": "v1", "name": "16 oz", "price": "450", "sku": "ST-CH16" }]
            },
            {
                "_id": "p2", "name": "Angle Grinder", "brand": "Bosch", "category": "power",
                "createdAt": "2024-05-01T00:00:00Z",
                "variants": [
                    { "_id": "v1", "name": "100 mm", "price": "3200" },
                    { "_id": "v2", "name": "125 mm", "price": "2900" }
                ]
            },
            {
                "_id": "p3", "name": "Hex Bolt", "category": "fasteners",
                "variants": [{ "_id": "m8", "name": "M8", "price": "12.50", "sku": "HB-M8" }]
            },
            {
                "_id": "p4", "name": "bench vise", "brand": "Stanley", "category": "hand",
                "createdAt": "2024-04-01T00:00:00Z",
                "variants": []
            }
        ]))
        .unwrap()
    }

    fn names<'a>(page: &Page<'a, Product>) -> Vec<&'a str> {
        page.items.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_default_query_sorts_newest_first() {
        let products = catalog();
        let page = ProductQuery::default().apply(&products);

        assert_eq!(
            names(&page),
            vec!["Angle Grinder", "bench vise", "Claw Hammer", "Hex Bolt"]
        );
        assert_eq!(page.total, 4);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_search_matches_name_brand_and_sku() {
        let products = catalog();
        let search = |term: &str| {
            let query = ProductQuery {
                search: Some(term.to_string()),
                sort: ProductSort::NameAsc,
                ..ProductQuery::default()
            };
            names(&query.apply(&products))
        };

        assert_eq!(search("HAMMER"), vec!["Claw Hammer"]);
        assert_eq!(search("stanley"), vec!["bench vise", "Claw Hammer"]);
        assert_eq!(search("hb-m8"), vec!["Hex Bolt"]);
        assert_eq!(search("   ").len(), 4);
        assert!(search("chainsaw").is_empty());
    }

    #[test]
    fn test_category_filter() {
        let products = catalog();
        let query = ProductQuery {
            category: Some(CategoryId::new("hand")),
            sort: ProductSort::NameDesc,
            ..ProductQuery::default()
        };

        assert_eq!(names(&query.apply(&products)), vec!["Claw Hammer", "bench vise"]);
    }

    #[test]
    fn test_price_sorts_use_lowest_variant_and_put_unpriced_last() {
        let products = catalog();
        let sorted = |sort| {
            let query = ProductQuery {
                sort,
                ..ProductQuery::default()
            };
            names(&query.apply(&products))
        };

        assert_eq!(
            sorted(ProductSort::PriceAsc),
            vec!["Hex Bolt", "Claw Hammer", "Angle Grinder", "bench vise"]
        );
        assert_eq!(
            sorted(ProductSort::PriceDesc),
            vec!["Angle Grinder", "Claw Hammer", "Hex Bolt", "bench vise"]
        );
    }

    #[test]
    fn test_pagination() {
        let products = catalog();
        let query = ProductQuery {
            sort: ProductSort::NameAsc,
            page: 2,
            per_page: 3,
            ..ProductQuery::default()
        };

        let page = query.apply(&products);
        assert_eq!(names(&page), vec!["Hex Bolt"]);
        assert_eq!(page.total_pages, 2);
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn test_page_bounds_are_normalized() {
        let products = catalog();
        let query = ProductQuery {
            page: 0,
            per_page: 0,
            sort: ProductSort::NameAsc,
            ..ProductQuery::default()
        };

        let page = query.apply(&products);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 1);
        assert_eq!(names(&page), vec!["Angle Grinder"]);
        assert_eq!(page.total_pages, 4);

        let past_end = ProductQuery {
            page: 9,
            ..ProductQuery::default()
        }
        .apply(&products);
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 4);
    }

    #[test]
    fn test_sort_from_str() {
        assert_eq!("price".parse::<ProductSort>(), Ok(ProductSort::PriceAsc));
        assert_eq!("name_desc".parse::<ProductSort>(), Ok(ProductSort::NameDesc));
        assert!("random".parse::<ProductSort>().is_err());
    }
}
