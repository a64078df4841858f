use crate::models::AddressInput;

/// `building, street, ward, city, township, district, region[, postal]`, skipping blanks.
pub fn format_address(address: &AddressInput) -> String {
    let base = [
        &address.building,
        &address.street,
        &address.ward,
        &address.city,
        &address.township,
        &address.district,
        &address.region,
    ]
    .iter()
    .map(|part| part.trim())
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(", ");

    let postal = address.postal_code.trim();
    match (base.is_empty(), postal.is_empty()) {
        (_, true) => base,
        (true, false) => postal.to_string(),
        (false, false) => format!("{}, {}", base, postal),
    }
}
