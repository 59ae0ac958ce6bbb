use custeio_core::error::CusteioError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), CusteioError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
