use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::ForecastProvider;
use crate::fetch::{HttpClient, fetch_json};
use crate::forecast::{Location, RawForecast};

const SOURCE: &str = "JMA";
const BASE_URL: &str = "https://www.jma.go.jp/bosai/forecast/data/overview_forecast";
const DEFAULT_AREA: &str = "120000";
const MISSING_TEXT: &str = "（取得できませんでした）";

static AREA_CODES: &[(&str, &str)] = &[
    ("北海道", "016000"),
    ("青森県", "020000"),
    ("岩手県", "030000"),
    ("宮城県", "040000"),
    ("秋田県", "050000"),
    ("山形県", "060000"),
    ("福島県", "070000"),
    ("茨城県", "080000"),
    ("栃木県", "090000"),
    ("群馬県", "100000"),
    ("埼玉県", "110000"),
    ("千葉県", "120000"),
    ("東京都", "130000"),
    ("神奈川県", "140000"),
    ("新潟県", "150000"),
    ("富山県", "160000"),
    ("石川県", "170000"),
    ("福井県", "180000"),
    ("山梨県", "190000"),
    ("長野県", "200000"),
    ("岐阜県", "210000"),
    ("静岡県", "220000"),
    ("愛知県", "230000"),
    ("三重県", "240000"),
    ("滋賀県", "250000"),
    ("京都府", "260000"),
    ("大阪府", "270000"),
    ("兵庫県", "280000"),
    ("奈良県", "290000"),
    ("和歌山県", "300000"),
    ("鳥取県", "310000"),
    ("島根県", "320000"),
    ("岡山県", "330000"),
    ("広島県", "340000"),
    ("山口県", "350000"),
    ("徳島県", "360000"),
    ("香川県", "370000"),
    ("愛媛県", "380000"),
    ("高知県", "390000"),
    ("福岡県", "400000"),
    ("佐賀県", "410000"),
    ("長崎県", "420000"),
    ("熊本県", "430000"),
    ("大分県", "440000"),
    ("宮崎県", "450000"),
    ("鹿児島県", "461000"),
    ("沖縄県", "471000"),
];

/// Japan Meteorological Agency prefecture overview.
///
/// JMA only publishes prose here, so records carry a description and no
/// numeric fields.
pub struct Jma {
    client: Arc<dyn HttpClient>,
    base_url: String,
}

impl Jma {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }
}

/// JMA office code for a prefecture name; unknown names map to Chiba.
pub fn area_code(prefecture: &str) -> &'static str {
    AREA_CODES
        .iter()
        .find(|(name, _)| *name == prefecture)
        .map(|(_, code)| *code)
        .unwrap_or(DEFAULT_AREA)
}

#[async_trait]
impl ForecastProvider for Jma {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn request(&self, location: &Location) -> Result<RawForecast> {
        let url = format!("{}/{}.json", self.base_url, area_code(&location.prefecture));
        let data = fetch_json(self.client.as_ref(), &url, &[]).await?;
        Ok(parse_overview(&data))
    }
}

pub fn parse_overview(data: &Value) -> RawForecast {
    let text = data["text"].as_str().unwrap_or(MISSING_TEXT);
    RawForecast::new(SOURCE).with_description(text)
}
