//! Order summary ("resumen de pedido") and WhatsApp link generation.
//!
//! The summary is the text the customer sends to the store over WhatsApp and
//! the same text stored on the order row.

use askama::Template;

use tq_core::{Cart, CartLine, ValidatedDelivery};

/// Plain text order summary.
#[derive(Template)]
#[template(path = "pedido/resumen.txt")]
struct ResumenPedido<'a> {
    store: &'a str,
    lines: Vec<SummaryLine>,
    total: String,
    nombre: &'a str,
    celular: &'a str,
    direccion: &'a str,
    pago: &'a str,
    notas: Option<&'a str>,
}

/// One cart line as it reads in the summary.
struct SummaryLine {
    heading: String,
    details: Vec<String>,
}

impl From<&CartLine> for SummaryLine {
    fn from(line: &CartLine) -> Self {
        let mut details = Vec::with_capacity(line.extras.len() + line.modifications.len() + 1);

        if let Some(cooking) = line.cooking.as_deref().filter(|c| !c.trim().is_empty()) {
            details.push(format!("Término: {}", cooking.trim()));
        }
        details.extend(
            line.extras
                .iter()
                .map(|extra| format!("+ {} ({})", extra.nombre, extra.precio)),
        );
        details.extend(
            line.modifications
                .iter()
                .filter(|m| !m.trim().is_empty())
                .map(|m| m.trim().to_owned()),
        );

        Self {
            heading: format!(
                "{}x {} ({})",
                line.quantity,
                line.nombre,
                line.computed_total()
            ),
            details,
        }
    }
}

/// Render the order summary for a store.
///
/// # Errors
///
/// Returns `askama::Error` if the template fails to render.
pub fn render_summary(
    cart: &Cart,
    delivery: &ValidatedDelivery,
    store: &str,
) -> Result<String, askama::Error> {
    let resumen = ResumenPedido {
        store,
        lines: cart.lines().iter().map(SummaryLine::from).collect(),
        total: cart.total().display(),
        nombre: &delivery.nombre,
        celular: delivery.celular.as_str(),
        direccion: &delivery.direccion,
        pago: delivery.metodo_pago.label(),
        notas: delivery.notas.as_deref(),
    };

    Ok(resumen.render()?.trim().to_owned())
}

/// Build a `wa.me` click-to-chat link with the message pre-filled.
///
/// `number` is the store's WhatsApp number; anything but digits is dropped.
/// Numbers without the country code get `country_code` prefixed.
#[must_use]
pub fn whatsapp_url(country_code: &str, number: &str, text: &str) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    let full = if digits.len() > 10 && digits.starts_with(country_code) {
        digits
    } else {
        format!("{country_code}{digits}")
    };

    format!("https://wa.me/{full}?text={}", urlencoding::encode(text))
}
