// Shop category page parsing
use crate::model::{ParserError, ScrapedListing};
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

const MIN_NAME_LEN: usize = 3;

pub trait Parser {
    fn parse_listings(&self, html: &str, page_url: &str) -> Result<Vec<ScrapedListing>, ParserError>;
}

/// Parser for the shop's category pages: one `item` tile per product.
pub struct ShopParser {
    item: Selector,
    price: Selector,
    link: Selector,
    image: Selector,
    price_in_text: Regex,
    cedi_amount: Regex,
}

impl ShopParser {
    pub fn new(item_selector: &str, price_selector: &str) -> Result<Self, ParserError> {
        Ok(Self {
            item: selector(item_selector)?,
            price: selector(price_selector)?,
            link: selector("a")?,
            image: selector("img")?,
            price_in_text: regex(r"₵\s*[\d,.]+|GHS\s*[\d,.]+|\$\s*[\d,.]+")?,
            cedi_amount: regex(r"₵\s*(\d+(?:,\d{3})*(?:\.\d{2})?)")?,
        })
    }

    /// Absolute URLs of every `/category/` link on the page, first occurrence order.
    pub fn category_links(&self, html: &str, base_url: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut links: Vec<String> = Vec::new();
        for anchor in document.select(&self.link) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if !href.contains("/category/") {
                continue;
            }
            if let Some(url) = join(base_url, href) {
                if !links.contains(&url) {
                    links.push(url);
                }
            }
        }
        links
    }

    fn listing(&self, item: ElementRef<'_>, page_url: &str) -> ScrapedListing {
        let link = item.select(&self.link).next();
        let image = item.select(&self.image).next();

        let product_url = link
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| join(page_url, href))
            .unwrap_or_else(|| page_url.to_string());

        let name = link
            .and_then(|a| self.link_name(a))
            .or_else(|| {
                image
                    .and_then(|img| img.value().attr("alt"))
                    .map(collapse_whitespace)
                    .filter(|alt| long_enough(alt))
            });

        let price = match item.select(&self.price).next() {
            Some(node) => clean_price(&node.text().collect::<String>()),
            None => {
                let text = item.text().collect::<String>();
                self.cedi_amount
                    .captures(&text)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| clean_price(m.as_str()))
            }
        };

        let image_url = image
            .and_then(|img| {
                let attrs = img.value();
                attrs
                    .attr("src")
                    .or_else(|| attrs.attr("data-src"))
                    .or_else(|| attrs.attr("data-lazy-src"))
            })
            .and_then(|src| join(page_url, src));

        ScrapedListing {
            name,
            price,
            image_url,
            product_url,
        }
    }

    /// Link `title` attribute, else the link text with price fragments removed.
    fn link_name(&self, anchor: ElementRef<'_>) -> Option<String> {
        if let Some(title) = anchor.value().attr("title").map(collapse_whitespace) {
            if long_enough(&title) {
                return Some(title);
            }
        }
        let text = anchor.text().collect::<Vec<_>>().join(" ");
        let stripped = self.price_in_text.replace_all(&text, "");
        Some(collapse_whitespace(&stripped)).filter(|name| long_enough(name))
    }
}

impl Parser for ShopParser {
    fn parse_listings(&self, html: &str, page_url: &str) -> Result<Vec<ScrapedListing>, ParserError> {
        let document = Html::parse_document(html);
        Ok(document
            .select(&self.item)
            .map(|item| self.listing(item, page_url))
            .collect())
    }
}

/// Extracts a number from a displayed price such as `₵1,234.50` or `GHS 12,50`.
///
/// A lone comma followed by exactly two digits is a decimal separator,
/// otherwise commas group thousands.
pub fn clean_price(text: &str) -> Option<f64> {
    let digits: String = text
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    let normalized = match (digits.contains(','), digits.contains('.')) {
        (true, true) => digits.replace(',', ""),
        (true, false) => match digits.rsplit_once(',') {
            Some((_, tail)) if tail.len() == 2 && digits.matches(',').count() == 1 => {
                digits.replace(',', ".")
            }
            _ => digits.replace(',', ""),
        },
        _ => digits,
    };

    normalized.parse::<f64>().ok().filter(|p| p.is_finite())
}

fn selector(css: &str) -> Result<Selector, ParserError> {
    Selector::parse(css).map_err(|e| ParserError::HtmlParseError(format!("{css}: {e}")))
}

fn regex(pattern: &str) -> Result<Regex, ParserError> {
    Regex::new(pattern).map_err(|e| ParserError::HtmlParseError(e.to_string()))
}

fn join(base: &str, href: &str) -> Option<String> {
    Url::parse(base)
        .and_then(|b| b.join(href.trim()))
        .ok()
        .map(String::from)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn long_enough(name: &str) -> bool {
    name.chars().count() >= MIN_NAME_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://shopdydy.com/category/laptops";

    fn parser() -> ShopParser {
        ShopParser::new(".item", ".price, .cost, .amount, [data-price]").unwrap()
    }

    #[test]
    fn clean_price_handles_separators() {
        assert_eq!(clean_price("₵1,234.50"), Some(1234.5));
        assert_eq!(clean_price("GHS 12,50"), Some(12.5));
        assert_eq!(clean_price("₵1,234"), Some(1234.0));
        assert_eq!(clean_price("₵ 12,345,678"), Some(12_345_678.0));
        assert_eq!(clean_price(" 899 "), Some(899.0));
        assert_eq!(clean_price("Call for price"), None);
        assert_eq!(clean_price(""), None);
    }

    #[test]
    fn parses_listing_tiles() {
        let html = r#"
            <div class="item">
              <a href="/product/hp-laserjet" title="HP LaserJet Pro M404dn">
                <img src="/img/hp.png" alt="printer">
              </a>
              <span class="price">₵3,450.00</span>
            </div>
            <div class="item">
              <a href="https://shopdydy.com/product/jbl-flip">JBL Flip 6 ₵1200</a>
              <img data-src="/img/jbl.webp">
              <p>Now only ₵1,200</p>
            </div>
            <div class="item">
              <a href="/product/x">ok</a>
              <img src="/img/x.png" alt="Canon Pixma Printer">
            </div>
        "#;
        let listings = parser().parse_listings(html, PAGE).unwrap();
        assert_eq!(listings.len(), 3);

        assert_eq!(listings[0].name.as_deref(), Some("HP LaserJet Pro M404dn"));
        assert_eq!(listings[0].price, Some(3450.0));
        assert_eq!(listings[0].product_url, "https://shopdydy.com/product/hp-laserjet");
        assert_eq!(listings[0].image_url.as_deref(), Some("https://shopdydy.com/img/hp.png"));

        assert_eq!(listings[1].name.as_deref(), Some("JBL Flip 6"));
        assert_eq!(listings[1].price, Some(1200.0));
        assert_eq!(listings[1].image_url.as_deref(), Some("https://shopdydy.com/img/jbl.webp"));

        assert_eq!(listings[2].name.as_deref(), Some("Canon Pixma Printer"));
        assert_eq!(listings[2].price, None);
    }

    #[test]
    fn listing_without_link_uses_page_url() {
        let html = r#"<div class="item"><img alt="Tripod Stand"><span class="amount">₵250</span></div>"#;
        let listings = parser().parse_listings(html, PAGE).unwrap();
        assert_eq!(listings[0].product_url, PAGE);
        assert_eq!(listings[0].name.as_deref(), Some("Tripod Stand"));
        assert_eq!(listings[0].price, Some(250.0));
    }

    #[test]
    fn collects_unique_category_links() {
        let html = r#"
            <nav>
              <a href="/category/laptops">Laptops</a>
              <a href="/category/audio/speakers">Speakers</a>
              <a href="/category/laptops">Laptops again</a>
              <a href="/about">About</a>
            </nav>
        "#;
        let links = parser().category_links(html, "https://shopdydy.com");
        assert_eq!(
            links,
            vec![
                "https://shopdydy.com/category/laptops",
                "https://shopdydy.com/category/audio/speakers",
            ]
        );
    }

    #[test]
    fn bad_selector_is_reported() {
        assert!(matches!(
            ShopParser::new("div[", ".price"),
            Err(ParserError::HtmlParseError(_))
        ));
    }
}
