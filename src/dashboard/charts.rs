//! Chart payloads handed to the browser for rendering

use serde::Serialize;

use crate::pipeline::{
    FamilyAggregates, GlobalAggregates, Ranking, StateAggregates, StoreAggregates, Trend,
};

/// Bars in the global product charts
pub const TOP_PRODUCTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartData {
    Pie {
        labels: Vec<String>,
        values: Vec<f64>,
    },
    Line {
        x: Vec<u32>,
        series: Vec<Series>,
        /// Horizontal dotted reference line
        reference: Option<f64>,
    },
    Bar {
        categories: Vec<String>,
        /// One series per colour group
        series: Vec<Series>,
        orientation: Orientation,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub id: &'static str,
    pub title: &'static str,
    #[serde(flatten)]
    pub data: ChartData,
}

impl Chart {
    fn new(id: &'static str, title: &'static str, data: ChartData) -> Self {
        Self { id, title, data }
    }
}

fn single(name: &str, values: Vec<f64>) -> Vec<Series> {
    vec![Series {
        name: name.to_string(),
        values,
    }]
}

fn trend_chart(id: &'static str, title: &'static str, trend: &Trend) -> Chart {
    let x = trend.points.iter().map(|p| p.period).collect();
    let series = vec![
        Series {
            name: "avg_sales".into(),
            values: trend.points.iter().map(|p| p.avg_sales).collect(),
        },
        Series {
            name: "max_sales".into(),
            values: trend.points.iter().map(|p| p.max_sales).collect(),
        },
    ];
    Chart::new(
        id,
        title,
        ChartData::Line {
            x,
            series,
            reference: trend.mean_avg_sales,
        },
    )
}

fn ranking_bar(id: &'static str, title: &'static str, ranking: &Ranking) -> Chart {
    let top = ranking.top_ascending(TOP_PRODUCTS);
    Chart::new(
        id,
        title,
        ChartData::Bar {
            categories: top.iter().map(|f| f.family.clone()).collect(),
            series: single("sales", top.iter().map(|f| f.sales).collect()),
            orientation: Orientation::Horizontal,
        },
    )
}

/// The six overview charts. Built once from the global aggregates.
pub fn overview_charts(globals: &GlobalAggregates) -> Vec<Chart> {
    vec![
        Chart::new(
            "piechart-days",
            "Average sales per day of the week",
            ChartData::Pie {
                labels: globals
                    .weekday_average
                    .iter()
                    .map(|d| d.day_of_week.to_string())
                    .collect(),
                values: globals.weekday_average.iter().map(|d| d.avg_sales).collect(),
            },
        ),
        trend_chart("linechart-months", "Average sales per month", &globals.monthly_trend),
        trend_chart("linechart-weeks", "Average sales per week", &globals.weekly_trend),
        ranking_bar(
            "barchart-products",
            "Top 10 most sold Product Categories",
            &globals.product_ranking,
        ),
        ranking_bar(
            "barchart-prom",
            "Top 10 Product Categories with the most profit obtained with promotions",
            &globals.promotion_ranking,
        ),
        Chart::new(
            "piechart-stores",
            "Where does the most profit come from? (Store types)",
            ChartData::Pie {
                labels: globals.store_type_split.iter().map(|s| s.store_type.clone()).collect(),
                values: globals.store_type_split.iter().map(|s| s.sales).collect(),
            },
        ),
    ]
}

pub fn store_charts(view: &StoreAggregates) -> Vec<Chart> {
    let mut years: Vec<i32> = view.yearly_sales.iter().map(|y| y.year).collect();
    years.dedup();

    // one series per promotion flag, aligned on the year axis
    let series = [false, true]
        .into_iter()
        .map(|flag| Series {
            name: if flag { "on promotion" } else { "no promotion" }.to_string(),
            values: years
                .iter()
                .map(|year| {
                    view.yearly_sales
                        .iter()
                        .find(|y| y.year == *year && y.on_promotion == flag)
                        .map_or(0.0, |y| y.sales)
                })
                .collect(),
        })
        .collect();

    vec![
        Chart::new(
            "barchart-store-sales",
            "Sales per year, with and without promotion",
            ChartData::Bar {
                categories: years.iter().map(|y| y.to_string()).collect(),
                series,
                orientation: Orientation::Vertical,
            },
        ),
        Chart::new(
            "piechart-store-products",
            "What are the most sold product categories?",
            ChartData::Pie {
                labels: view.family_breakdown.iter().map(|f| f.family.clone()).collect(),
                values: view.family_breakdown.iter().map(|f| f.sales).collect(),
            },
        ),
    ]
}

pub fn state_charts(view: &StateAggregates) -> Vec<Chart> {
    vec![Chart::new(
        "barchart-state-sales",
        "Most profitable shops in region",
        ChartData::Bar {
            categories: view.top_stores.iter().map(|s| s.store_id.to_string()).collect(),
            series: single("sales", view.top_stores.iter().map(|s| s.sales).collect()),
            orientation: Orientation::Horizontal,
        },
    )]
}

pub fn family_charts(view: &FamilyAggregates) -> Vec<Chart> {
    vec![Chart::new(
        "barchart-product-city",
        "Top 10 cities where the product was most successful",
        ChartData::Bar {
            categories: view.top_cities.iter().map(|c| c.city.clone()).collect(),
            series: single("sales", view.top_cities.iter().map(|c| c.sales).collect()),
            orientation: Orientation::Horizontal,
        },
    )]
}
