use engine_logging::engine_warn;
use scraper::{ElementRef, Html, Selector};
use url::Url;
use vine_core::Item;

use crate::Page;

/// Turns one downloaded queue page into item records.
pub trait ItemParser: Send + Sync {
    fn parse(&self, page: &Page) -> Vec<Item>;
}

/// Extracts Vine item tiles:
/// - one item per `div.vvp-item-tile`
/// - id from `input[data-asin]`, link from `a.a-link-normal`
/// - title from `span.a-truncate-full`, else the image `alt`
///
/// Tiles missing an id or a link are skipped.
#[derive(Debug, Clone)]
pub struct TileParser {
    tile: Option<Selector>,
    asin: Option<Selector>,
    link: Option<Selector>,
    image: Option<Selector>,
    title: Option<Selector>,
}

impl TileParser {
    pub fn new() -> Self {
        Self {
            tile: Selector::parse("div.vvp-item-tile").ok(),
            asin: Selector::parse("input[data-asin]").ok(),
            link: Selector::parse("a.a-link-normal").ok(),
            image: Selector::parse("img").ok(),
            title: Selector::parse("span.a-truncate-full").ok(),
        }
    }

    fn parse_tile(&self, tile: ElementRef, page: &Page, base: Option<&Url>) -> Option<Item> {
        let id = first(tile, &self.asin)
            .and_then(|el| el.value().attr("data-asin"))
            .map(str::trim)
            .filter(|id| !id.is_empty())?;
        let href = first(tile, &self.link).and_then(|el| el.value().attr("href"))?;
        let url = resolve(base, href);

        let image = first(tile, &self.image);
        let image_url = image
            .and_then(|img| img.value().attr("src"))
            .map(|src| resolve(base, src));

        let title = first(tile, &self.title)
            .map(|span| span.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty())
            .or_else(|| {
                image
                    .and_then(|img| img.value().attr("alt"))
                    .map(|alt| alt.trim().to_string())
            })
            .unwrap_or_default();

        Some(Item::new(id, title, url, image_url, page.queue))
    }
}

impl Default for TileParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemParser for TileParser {
    fn parse(&self, page: &Page) -> Vec<Item> {
        let Some(tile_sel) = self.tile.as_ref() else {
            return Vec::new();
        };
        let doc = Html::parse_document(&page.html);
        let base = Url::parse(&page.final_url).ok();

        let mut items = Vec::new();
        for tile in doc.select(tile_sel) {
            match self.parse_tile(tile, page, base.as_ref()) {
                Some(item) => items.push(item),
                None => engine_warn!(
                    "Could not parse a tile completely in {} (page {}); skipping it",
                    page.queue,
                    page.number
                ),
            }
        }
        items
    }
}

fn first<'a>(scope: ElementRef<'a>, selector: &Option<Selector>) -> Option<ElementRef<'a>> {
    selector.as_ref().and_then(|sel| scope.select(sel).next())
}

fn resolve(base: Option<&Url>, href: &str) -> String {
    base.and_then(|base| base.join(href).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| href.to_string())
}
