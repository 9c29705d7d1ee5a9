// THEORY:
// The `sizing` module is the size-lookup collaborator that consumes a finished
// `MeasurementResult`. It is deliberately a static table lookup with no image
// knowledge at all: foot length picks the row of a size chart, and the
// width/length ratio picks a width fitting.
//
// Key rules:
// 1.  **Nearest Row, Then Up**: The chart row with the closest foot length wins
//     (first row on ties). If the foot is longer than that row and a larger row
//     exists, we step up one. A shoe a little too long fits, one a little too
//     short does not.
// 2.  **Korean Sizing Is Length**: For adult charts the KR size is the foot length
//     in millimetres itself.
// 3.  **Width by Ratio**: Adults are classified narrow/standard/wide/extra-wide by
//     `width / length`, with separate bands for men and women. Children are always
//     standard and always get growth-room advice.

use crate::error::{MeasureError, Result};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeGroup {
    Men,
    Women,
    Kids,
}

impl fmt::Display for SizeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeGroup::Men => write!(f, "Men"),
            SizeGroup::Women => write!(f, "Women"),
            SizeGroup::Kids => write!(f, "Kids"),
        }
    }
}

/// Picks the most likely chart from foot length alone.
pub fn infer_group(foot_length_mm: f64) -> SizeGroup {
    if foot_length_mm <= 215.0 {
        SizeGroup::Kids
    } else if foot_length_mm <= 260.0 {
        SizeGroup::Women
    } else {
        SizeGroup::Men
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ChartRow {
    foot_length_mm: f64,
    cn: f64,
    eu: f64,
    us: f64,
    uk: f64,
    jp: Option<f64>,
}

const fn adult(foot_length_mm: f64, cn: f64, us: f64, uk: f64, jp: f64) -> ChartRow {
    // CN and EU numbering coincide for adult shoes.
    ChartRow { foot_length_mm, cn, eu: cn, us, uk, jp: Some(jp) }
}

const fn kid(foot_length_mm: f64, cn: f64, eu: f64, us: f64, uk: f64) -> ChartRow {
    ChartRow { foot_length_mm, cn, eu, us, uk, jp: None }
}

const MEN_CHART: &[ChartRow] = &[
    adult(240.0, 38.5, 6.0, 5.5, 24.0),
    adult(245.0, 39.0, 6.5, 6.0, 24.5),
    adult(250.0, 40.0, 7.0, 6.5, 25.0),
    adult(255.0, 40.5, 7.5, 7.0, 25.5),
    adult(260.0, 41.0, 8.0, 7.5, 26.0),
    adult(265.0, 42.0, 8.5, 8.0, 26.5),
    adult(270.0, 42.5, 9.0, 8.5, 27.0),
    adult(275.0, 43.0, 9.5, 9.0, 27.5),
    adult(280.0, 44.5, 10.0, 9.5, 28.0),
    adult(285.0, 45.0, 10.5, 10.0, 28.5),
    adult(290.0, 45.5, 11.0, 10.5, 29.0),
    adult(295.0, 46.0, 11.5, 11.0, 29.5),
    adult(300.0, 46.5, 12.0, 11.5, 30.0),
    adult(305.0, 47.0, 12.5, 12.0, 30.5),
    adult(310.0, 47.5, 13.0, 12.5, 31.0),
];

const WOMEN_CHART: &[ChartRow] = &[
    adult(225.0, 35.0, 5.0, 2.5, 22.5),
    adult(230.0, 36.0, 5.5, 3.0, 23.0),
    adult(235.0, 37.0, 6.0, 3.5, 23.5),
    adult(240.0, 38.0, 6.5, 4.5, 24.0),
    adult(245.0, 39.0, 7.0, 5.0, 24.5),
    adult(245.0, 39.5, 7.5, 5.5, 25.0),
    adult(250.0, 40.0, 8.0, 6.0, 25.5),
    adult(250.0, 40.5, 8.5, 6.5, 26.0),
    adult(255.0, 41.0, 9.0, 7.0, 26.5),
    adult(255.0, 41.5, 9.5, 7.5, 27.0),
];

const KIDS_CHART: &[ChartRow] = &[
    kid(80.0, 19.0, 17.0, 1.0, 0.5),
    kid(85.0, 19.5, 18.0, 2.5, 2.0),
    kid(90.0, 20.0, 18.5, 3.0, 2.5),
    kid(95.0, 20.5, 19.0, 3.5, 3.0),
    kid(100.0, 21.0, 19.5, 4.0, 3.5),
    kid(105.0, 21.5, 20.0, 4.5, 4.0),
    kid(110.0, 22.0, 20.5, 5.0, 4.5),
    kid(115.0, 22.5, 21.0, 5.5, 5.0),
    kid(120.0, 23.0, 21.5, 6.0, 5.5),
    kid(125.0, 23.5, 22.0, 6.5, 6.0),
    kid(130.0, 24.0, 22.5, 7.0, 6.5),
    kid(135.0, 24.5, 23.5, 7.5, 7.0),
    kid(140.0, 25.0, 24.5, 8.0, 7.5),
    kid(145.0, 25.5, 25.0, 8.5, 8.0),
    kid(150.0, 26.0, 25.5, 9.0, 8.5),
    kid(155.0, 26.5, 26.0, 9.5, 9.0),
    kid(160.0, 27.0, 26.5, 10.0, 9.5),
    kid(165.0, 27.5, 27.0, 10.5, 10.0),
    kid(170.0, 28.0, 27.5, 11.0, 10.5),
    kid(175.0, 28.5, 28.0, 11.5, 11.0),
    kid(180.0, 29.5, 28.5, 12.0, 11.5),
    kid(185.0, 30.0, 29.5, 12.5, 12.0),
    kid(190.0, 31.0, 30.5, 13.0, 12.5),
    kid(195.0, 31.5, 31.0, 13.5, 13.0),
    kid(200.0, 32.0, 32.0, 14.0, 13.5),
    kid(205.0, 33.0, 33.0, 14.5, 1.0),
    kid(210.0, 33.5, 34.0, 15.0, 1.5),
    kid(215.0, 34.0, 35.0, 15.5, 2.0),
];

fn chart(group: SizeGroup) -> &'static [ChartRow] {
    match group {
        SizeGroup::Men => MEN_CHART,
        SizeGroup::Women => WOMEN_CHART,
        SizeGroup::Kids => KIDS_CHART,
    }
}

fn lookup_row(chart: &[ChartRow], foot_length_mm: f64) -> ChartRow {
    let mut closest = 0;
    for (i, row) in chart.iter().enumerate() {
        let distance = (row.foot_length_mm - foot_length_mm).abs();
        if distance < (chart[closest].foot_length_mm - foot_length_mm).abs() {
            closest = i;
        }
    }
    if foot_length_mm > chart[closest].foot_length_mm && closest + 1 < chart.len() {
        closest += 1;
    }
    chart[closest]
}

/// Shoe sizes in each regional system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionalSizes {
    pub cn: f64,
    pub eu: f64,
    pub us: f64,
    pub uk: f64,
    pub jp: Option<f64>,
    pub kr: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidthType {
    Narrow,
    Standard,
    Wide,
    ExtraWide,
}

impl WidthType {
    pub fn label(&self) -> &'static str {
        match self {
            WidthType::Narrow => "N",
            WidthType::Standard => "M",
            WidthType::Wide => "W",
            WidthType::ExtraWide => "XW",
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            WidthType::Narrow => "choose a narrow last or adjust the fit with an insole",
            WidthType::Standard => "most regular lasts will fit",
            WidthType::Wide => "choose a wide last or go half a size up",
            WidthType::ExtraWide => "choose an extra-wide last or a dedicated wide-foot model",
        }
    }
}

// (upper ratio bound, width type, shoe width code); anything above the last
// bound is extra wide.
const MEN_WIDTH_BANDS: &[(f64, WidthType, &str)] = &[
    (0.35, WidthType::Narrow, "AA"),
    (0.38, WidthType::Standard, "B/C"),
    (0.41, WidthType::Wide, "D"),
];

const WOMEN_WIDTH_BANDS: &[(f64, WidthType, &str)] = &[
    (0.33, WidthType::Narrow, "AA"),
    (0.36, WidthType::Standard, "B"),
    (0.38, WidthType::Wide, "D"),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WidthAnalysis {
    pub width_type: WidthType,
    /// Shoe width code (AA, B, D, EE, ...).
    pub code: &'static str,
    /// Width divided by length.
    pub ratio: f64,
}

pub fn analyze_width(group: SizeGroup, foot_length_mm: f64, foot_width_mm: f64) -> WidthAnalysis {
    let ratio = foot_width_mm / foot_length_mm;
    let bands = match group {
        SizeGroup::Men => MEN_WIDTH_BANDS,
        SizeGroup::Women => WOMEN_WIDTH_BANDS,
        SizeGroup::Kids => {
            return WidthAnalysis { width_type: WidthType::Standard, code: "M", ratio };
        }
    };
    bands
        .iter()
        .find(|(upper, _, _)| ratio < *upper)
        .map(|&(_, width_type, code)| WidthAnalysis { width_type, code, ratio })
        .unwrap_or(WidthAnalysis { width_type: WidthType::ExtraWide, code: "EE", ratio })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeRecommendation {
    pub group: SizeGroup,
    pub sizes: RegionalSizes,
    pub width: WidthAnalysis,
    pub adjustment: Option<&'static str>,
    pub foot_length_mm: f64,
    pub foot_width_mm: f64,
}

fn validate_measurements(foot_length_mm: f64, foot_width_mm: f64) -> Result<()> {
    if !foot_length_mm.is_finite() || foot_length_mm <= 0.0 {
        return Err(MeasureError::InvalidInput(format!(
            "foot length must be positive, got {foot_length_mm}"
        )));
    }
    if !foot_width_mm.is_finite() || foot_width_mm < 0.0 {
        return Err(MeasureError::InvalidInput(format!(
            "foot width must be non-negative, got {foot_width_mm}"
        )));
    }
    Ok(())
}

/// Looks up the recommended size in the chart of `group`.
pub fn recommend(group: SizeGroup, foot_length_mm: f64, foot_width_mm: f64) -> Result<SizeRecommendation> {
    validate_measurements(foot_length_mm, foot_width_mm)?;

    let row = lookup_row(chart(group), foot_length_mm);
    let width = analyze_width(group, foot_length_mm, foot_width_mm);
    let adjustment = match (group, width.width_type) {
        (SizeGroup::Kids, _) => Some("go half a size up to leave 5-10mm of growth room"),
        (_, WidthType::Wide | WidthType::ExtraWide) => Some("consider half a size up"),
        _ => None,
    };
    let kr = match group {
        SizeGroup::Kids => None,
        _ => Some(foot_length_mm),
    };

    Ok(SizeRecommendation {
        group,
        sizes: RegionalSizes { cn: row.cn, eu: row.eu, us: row.us, uk: row.uk, jp: row.jp, kr },
        width,
        adjustment,
        foot_length_mm,
        foot_width_mm,
    })
}

/// Men's and women's recommendations, plus kids' for short feet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeReport {
    pub men: SizeRecommendation,
    pub women: SizeRecommendation,
    pub kids: Option<SizeRecommendation>,
    pub suggested: SizeGroup,
    pub foot_length_mm: f64,
    pub foot_width_mm: f64,
    pub ratio: f64,
}

pub fn size_report(foot_length_mm: f64, foot_width_mm: f64) -> Result<SizeReport> {
    let suggested = infer_group(foot_length_mm);
    let kids = match suggested {
        SizeGroup::Kids => Some(recommend(SizeGroup::Kids, foot_length_mm, foot_width_mm)?),
        _ => None,
    };
    Ok(SizeReport {
        men: recommend(SizeGroup::Men, foot_length_mm, foot_width_mm)?,
        women: recommend(SizeGroup::Women, foot_length_mm, foot_width_mm)?,
        kids,
        suggested,
        foot_length_mm,
        foot_width_mm,
        ratio: foot_width_mm / foot_length_mm,
    })
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Foot length: {:.1} mm ({:.1} cm)", self.foot_length_mm, self.foot_length_mm / 10.0)?;
        writeln!(f, "Foot width:  {:.1} mm ({:.1} cm)", self.foot_width_mm, self.foot_width_mm / 10.0)?;
        writeln!(f, "Width/length ratio: {:.3}", self.ratio)?;
        writeln!(f, "Suggested chart: {}", self.suggested)?;
        writeln!(f)?;
        writeln!(f, "{:<8} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}", "Chart", "CN", "EU", "US", "UK", "JP", "Width")?;
        for rec in [Some(&self.men), Some(&self.women), self.kids.as_ref()].into_iter().flatten() {
            let jp = rec.sizes.jp.map_or_else(|| "-".to_string(), |jp| format!("{jp}"));
            writeln!(
                f,
                "{:<8} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
                rec.group.to_string(),
                rec.sizes.cn,
                rec.sizes.eu,
                rec.sizes.us,
                rec.sizes.uk,
                jp,
                rec.width.code
            )?;
            if let Some(adjustment) = rec.adjustment {
                writeln!(f, "         note: {adjustment}")?;
            }
        }
        writeln!(f)?;
        let suggested = match self.suggested {
            SizeGroup::Men => &self.men,
            SizeGroup::Women => &self.women,
            SizeGroup::Kids => self.kids.as_ref().unwrap_or(&self.women),
        };
        write!(f, "Fit ({}): {}", suggested.width.width_type.label(), suggested.width.width_type.suggestion())
    }
}
