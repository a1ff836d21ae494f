//! `catload template` command - print the expected export columns

use console::style;
use miette::{IntoDiagnostic, Result};
use std::io;

use crate::source::Column;

/// Attribute axis used in the template to show the attribute column family
const EXAMPLE_AXIS: &str = "pa_couleur";

#[derive(clap::Args, Debug)]
pub struct TemplateArgs {
    /// Omit the example rows
    #[arg(long)]
    pub header_only: bool,
}

/// Header row: every fixed column, then one example attribute axis
pub fn template_headers() -> Vec<String> {
    let mut headers: Vec<String> = Column::ALL.iter().map(|c| c.header().to_string()).collect();
    headers.extend([
        format!("attribute:{EXAMPLE_AXIS}"),
        format!("attribute_data:{EXAMPLE_AXIS}"),
        format!("attribute_default:{EXAMPLE_AXIS}"),
        format!("meta:attribute_{EXAMPLE_AXIS}"),
    ]);
    headers
}

/// Example cells for a variable product and one of its variants
fn example_rows() -> Vec<Vec<String>> {
    let parent = |column: Column| -> &'static str {
        match column {
            Column::Sku => "TBL-01",
            Column::Status => "publish",
            Column::ProductType => "variable",
            Column::Title => "Table basse",
            Column::Content => "Table basse en chêne massif.",
            Column::RegularPrice => "189,00",
            Column::ManageStock => "yes",
            Column::Stock => "12",
            Column::Categories => "Mobilier > Tables | Salon",
            Column::Tags => "chêne|salon",
            Column::Images => "https://cdn.example.com/tbl-01.jpg ! alt: Table basse ! title: TBL-01",
            Column::PbqEnabled => "yes",
            Column::PbqPricingType => "percentage",
            Column::PbqDiscountTable => r#"[{"qty":1,"discount":"0"},{"qty":10,"discount":"5"}]"#,
            _ => "",
        }
    };
    let child = |column: Column| -> &'static str {
        match column {
            Column::Sku => "TBL-01-RED",
            Column::Status => "publish",
            Column::ProductType => "variation",
            Column::Title => "Table basse rouge",
            Column::ParentSku => "TBL-01",
            Column::RegularPrice => "199,00",
            Column::MinimumQuantity => "1",
            _ => "",
        }
    };

    let mut first: Vec<String> = Column::ALL.iter().map(|c| parent(*c).to_string()).collect();
    first.extend(["Rouge|Bleu", "0|1|1", "Rouge", ""].map(String::from));
    let mut second: Vec<String> = Column::ALL.iter().map(|c| child(*c).to_string()).collect();
    second.extend(["", "", "", "Rouge"].map(String::from));
    vec![first, second]
}

pub fn run(args: TemplateArgs) -> Result<()> {
    // Output to stdout (can be redirected to file)
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(template_headers()).into_diagnostic()?;
    if !args.header_only {
        for row in example_rows() {
            writer.write_record(&row).into_diagnostic()?;
        }
    }
    writer.flush().into_diagnostic()?;

    // Print usage hint to stderr so it doesn't interfere with redirected output
    eprintln!();
    eprintln!(
        "{} Template generated. Redirect to file: catload template > export.csv",
        style("→").blue()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::read_source_from;

    #[test]
    fn test_template_round_trips_through_reader() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(template_headers()).unwrap();
        for row in example_rows() {
            writer.write_record(&row).unwrap();
        }
        let bytes = writer.into_inner().unwrap();

        let table = read_source_from(bytes.as_slice()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.schema.axes().len(), 1);
        assert_eq!(table.schema.axes()[0].slug, "couleur");
        assert_eq!(table.schema.cell(&table.rows[1], Column::ParentSku), Some("TBL-01"));
    }
}
