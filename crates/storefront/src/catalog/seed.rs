//! Built-in PreludaStvar catalog.
//!
//! Every poster comes in the same two sizes and three finishes; only the
//! classification flags differ.

use preluda_core::{
    Finish, FinishId, LocalizedText, Multiplier, Price, Product, ProductId, Size, SizeId, Slug,
};

use super::CatalogError;

/// Surcharge for either framed finish, in hundredths (1.75).
const FRAME_MULTIPLIER_HUNDREDTHS: u32 = 175;

/// Bundles sold as a set; tagged `pack` on top of the default tags.
const PACKS: &[&str] = &["cecapack"];

struct SeedRow {
    id: &'static str,
    slug: &'static str,
    display_slug: &'static str,
    featured: bool,
    new: bool,
    trending: bool,
}

const fn row(
    id: &'static str,
    slug: &'static str,
    display_slug: &'static str,
    (featured, new, trending): (bool, bool, bool),
) -> SeedRow {
    SeedRow {
        id,
        slug,
        display_slug,
        featured,
        new,
        trending,
    }
}

const F: bool = false;
const T: bool = true;

#[rustfmt::skip]
const ROWS: &[SeedRow] = &[
    row("1", "apsolutnotvoj", "APSOLUTNOTVOJ", (T, F, T)),
    row("2", "bangbang", "bangbang", (T, F, T)),
    row("3", "casino", "CASINO", (T, F, F)),
    row("4", "elenablakablaka", "ELENABLAKABLAKA", (F, T, F)),
    row("5", "grshemiach", "GRSHEMIACH", (F, T, F)),
    row("6", "idepetak", "IDEPETAK", (T, F, T)),
    row("7", "jecapack", "JECAPACK", (F, T, F)),
    row("8", "lajukuje", "LAJUKUJE", (F, F, T)),
    row("9", "mkmz", "MKMZ", (F, T, F)),
    row("10", "oprostajna", "OPROSTAJNA", (F, T, F)),
    row("11", "vladoandjele", "VLADOANDJELE", (F, T, F)),
    row("12", "zovime", "zovime", (F, F, T)),
    row("13", "bass", "bass", (F, T, F)),
    row("14", "bezkoda", "bezkoda", (F, T, F)),
    row("15", "bicu1", "bicu1", (F, T, F)),
    row("16", "bik", "bik", (F, F, F)),
    row("17", "daraskinemsnjom", "daraskinemsnjom", (F, F, F)),
    row("18", "januar", "januar", (F, F, F)),
    row("19", "jaocu", "jaocu", (F, F, F)),
    row("20", "kaonik", "kaonik", (F, F, F)),
    row("21", "kleopatra", "kleopatra", (F, F, F)),
    row("22", "kozapamti", "kozapamti", (F, F, F)),
    row("23", "krimirad", "krimirad", (F, F, F)),
    row("24", "mojbeograd", "mojbeograd", (F, F, F)),
    row("25", "nevaljala", "nevaljala", (F, F, F)),
    row("26", "nikad", "nikad", (F, F, F)),
    row("27", "puma1", "puma1", (F, F, F)),
    row("28", "sat", "sat", (F, F, F)),
    row("29", "smztvj", "smztvj", (F, F, F)),
    row("30", "svesto", "svesto", (F, F, F)),
    row("31", "cecapack", "cecapack", (F, T, F)),
];

fn sizes() -> Vec<Size> {
    vec![
        Size {
            id: SizeId::new("a4"),
            name: "A4".to_string(),
            dimensions: "21x30 cm".to_string(),
            base_price: Price::new(900),
        },
        Size {
            id: SizeId::new("a3"),
            name: "A3".to_string(),
            dimensions: "30x40 cm".to_string(),
            base_price: Price::new(1200),
        },
    ]
}

fn finishes() -> Result<Vec<Finish>, CatalogError> {
    let framed = Multiplier::from_hundredths(FRAME_MULTIPLIER_HUNDREDTHS)
        .map_err(|e| CatalogError::InvalidRecord(e.to_string()))?;

    Ok(vec![
        Finish {
            id: FinishId::new("no-frame"),
            name: LocalizedText::new("Bez rama", "No frame"),
            price_multiplier: Multiplier::ONE,
        },
        Finish {
            id: FinishId::new("black-frame"),
            name: LocalizedText::new("Crni ram", "Black frame"),
            price_multiplier: framed,
        },
        Finish {
            id: FinishId::new("white-frame"),
            name: LocalizedText::new("Beli ram", "White frame"),
            price_multiplier: framed,
        },
    ])
}

/// Materialize the built-in products in catalog order.
pub(super) fn products() -> Result<Vec<Product>, CatalogError> {
    let sizes = sizes();
    let finishes = finishes()?;

    ROWS.iter()
        .map(|row| {
            let slug = Slug::parse(row.slug)
                .map_err(|e| CatalogError::InvalidRecord(format!("{}: {e}", row.slug)))?;

            let mut tags = vec!["music".to_string(), "lyrics".to_string()];
            if PACKS.contains(&row.slug) {
                tags.push("pack".to_string());
            }

            Ok(Product {
                id: ProductId::new(row.id),
                slug,
                display_slug: row.display_slug.to_string(),
                name: LocalizedText::same(row.display_slug.to_uppercase()),
                artist: None,
                sizes: sizes.clone(),
                finishes: finishes.clone(),
                tags,
                is_featured: row.featured,
                is_new: row.new,
                is_trending: row.trending,
                is_active: true,
            })
        })
        .collect()
}
