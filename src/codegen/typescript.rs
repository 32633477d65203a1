use std::path::Path;

use super::projector::{ProjectedEntity, TsType};

fn ts_name(ty: TsType) -> &'static str {
    match ty {
        TsType::Number => "number",
        TsType::String => "string",
        TsType::Boolean => "boolean",
    }
}

/// Renders the projected entities as TypeScript interface declarations.
/// Nullable columns become optional properties.
pub fn render_typescript(units: &[ProjectedEntity]) -> String {
    let mut out = String::new();
    for (index, unit) in units.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&format!("export interface {} {{\n", unit.name));
        for field in &unit.fields {
            let marker = if field.optional { "?" } else { "" };
            out.push_str(&format!(
                "  {}{}: {};\n",
                field.name,
                marker,
                ts_name(field.ts_type)
            ));
        }
        out.push_str("}\n");
    }
    out
}

/// Writes the rendered declarations to disk. The only I/O in the codegen
/// path.
pub async fn write_types_file(path: &Path, units: &[ProjectedEntity]) -> std::io::Result<()> {
    tokio::fs::write(path, render_typescript(units)).await
}
