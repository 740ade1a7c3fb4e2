use crate::domain::model::RawTable;
use crate::utils::error::Result;
use serde_json::Value;

/// Read CSV bytes into a raw table.
///
/// Cell types are inferred so the schema mapper can tell text columns from
/// numeric ones: values that parse as numbers become JSON numbers, blank
/// cells become `Null`, everything else stays a string.
pub fn read_csv(data: &[u8]) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row: Vec<Value> = record.iter().map(infer_cell).collect();
        // Pad short records so every row aligns with the header.
        row.resize(headers.len(), Value::Null);
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

fn infer_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(trimmed.to_string())
}

/// CSV template for batch upload, mirroring the canonical schema with
/// example products.
pub fn batch_template() -> String {
    let mut lines = vec![
        "product_name,description,material,intended_use,origin,quantity,unit_value,customs_value"
            .to_string(),
    ];
    lines.push(
        "LED Desk Lamp,\"Adjustable LED lamp with USB charging port, metal base\",\"Aluminum, plastic, LED\",Office/home lighting,China,100,25.50,2550".to_string(),
    );
    lines.push(
        "Men's Cotton T-Shirt,\"Short sleeve crew neck t-shirt, 100% cotton, size L\",100% Cotton,Casual wear,Bangladesh,500,8.75,4375".to_string(),
    );
    lines.push(
        "Stainless Steel Water Bottle,\"Double-wall insulated bottle, 750ml capacity\",Stainless steel 304,Beverage container,India,200,12.00,2400".to_string(),
    );
    lines.push(
        "Wireless Bluetooth Headphones,Over-ear headphones with noise cancellation,\"Plastic, foam padding\",Audio listening,Vietnam,50,85.00,4250".to_string(),
    );
    lines.push(
        "Yoga Mat,\"Non-slip exercise mat, 6mm thickness\",TPE (Thermoplastic Elastomer),Exercise and yoga,Taiwan,150,15.50,2325".to_string(),
    );
    lines.join("\n") + "\n"
}
