//! Offer lifecycle email templates.
//!
//! Bodies are built procedurally as paired HTML/plain-text parts. Amounts go
//! through `service_core::money` so emails show the same fr-BE formatting as
//! the rest of the platform.

use crate::models::{OfferEmail, OfferEquipmentLine};
use service_core::money::format_amount;

/// A subject plus both bodies, ready to hand to a provider.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn eur(amount: rust_decimal::Decimal) -> String {
    format_amount(amount, "EUR")
}

/// Mail announcing that an offer is ready for the client, with its equipment
/// list and the financed/monthly totals.
pub fn offer_ready(offer: &OfferEmail, lines: &[OfferEquipmentLine]) -> RenderedEmail {
    let subject = "Votre offre de leasing est prête".to_string();

    let mut text = format!(
        "Bonjour {},\n\nVotre offre de leasing est prête.\n\nÉquipements :\n",
        offer.client_name
    );
    for line in lines {
        text.push_str(&format!(
            "- {} x {} : {}/mois\n",
            line.quantity,
            line.title,
            eur(line.monthly_payment_total)
        ));
    }
    text.push_str(&format!(
        "\nMontant financé : {}\nMensualité totale : {}/mois\n\nCordialement,\nL'équipe Leazr\n",
        eur(offer.amount),
        eur(offer.monthly_payment)
    ));

    let mut rows = String::new();
    for line in lines {
        rows.push_str(&format!(
            "<tr><td>{}</td><td style=\"text-align:center\">{}</td><td style=\"text-align:right\">{}/mois</td></tr>",
            escape_html(&line.title),
            line.quantity,
            eur(line.monthly_payment_total)
        ));
    }
    let body_html = format!(
        "<html><body>\
         <p>Bonjour {},</p>\
         <p>Votre offre de leasing est prête.</p>\
         <table style=\"border-collapse:collapse;width:100%\">\
         <tr><th style=\"text-align:left\">Équipement</th><th>Qté</th><th style=\"text-align:right\">Mensualité</th></tr>\
         {}\
         </table>\
         <p>Montant financé : <strong>{}</strong><br>\
         Mensualité totale : <strong>{}/mois</strong></p>\
         <p>Cordialement,<br>L'équipe Leazr</p>\
         </body></html>",
        escape_html(&offer.client_name),
        rows,
        eur(offer.amount),
        eur(offer.monthly_payment)
    );

    RenderedEmail {
        subject,
        body_html,
        body_text: text,
    }
}

/// Confirmation mail after an offer has been signed. Falls back to the client
/// name when no distinct signer was recorded.
pub fn offer_signed(offer: &OfferEmail) -> RenderedEmail {
    let subject = "Votre offre a bien été signée".to_string();
    let signer = offer
        .signer_name
        .as_deref()
        .unwrap_or(offer.client_name.as_str());
    let signed_on = offer
        .signed_at
        .map(|at| at.format("%d/%m/%Y").to_string())
        .unwrap_or_default();

    let body_text = format!(
        "Bonjour {},\n\nVotre offre a bien été signée par {} le {}.\n\n\
         Mensualité : {}/mois\n\nNous revenons vers vous dès que le dossier passe chez le bailleur.\n\n\
         Cordialement,\nL'équipe Leazr\n",
        offer.client_name,
        signer,
        signed_on,
        eur(offer.monthly_payment)
    );

    let body_html = format!(
        "<html><body>\
         <p>Bonjour {},</p>\
         <p>Votre offre a bien été signée par <strong>{}</strong> le {}.</p>\
         <p>Mensualité : <strong>{}/mois</strong></p>\
         <p>Nous revenons vers vous dès que le dossier passe chez le bailleur.</p>\
         <p>Cordialement,<br>L'équipe Leazr</p>\
         </body></html>",
        escape_html(&offer.client_name),
        escape_html(signer),
        signed_on,
        eur(offer.monthly_payment)
    );

    RenderedEmail {
        subject,
        body_html,
        body_text,
    }
}

/// Onboarding mail sent when a company account is opened.
pub fn welcome(company_name: &str, contact_name: &str) -> RenderedEmail {
    let subject = "Bienvenue sur Leazr".to_string();

    let body_text = format!(
        "Bonjour {},\n\nLe compte de {} est maintenant actif. Vous pouvez créer vos premières \
         offres de leasing et inviter vos collaborateurs.\n\nCordialement,\nL'équipe Leazr\n",
        contact_name, company_name
    );

    let body_html = format!(
        "<html><body>\
         <p>Bonjour {},</p>\
         <p>Le compte de <strong>{}</strong> est maintenant actif. Vous pouvez créer vos \
         premières offres de leasing et inviter vos collaborateurs.</p>\
         <p>Cordialement,<br>L'équipe Leazr</p>\
         </body></html>",
        escape_html(contact_name),
        escape_html(company_name)
    );

    RenderedEmail {
        subject,
        body_html,
        body_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn offer(client_name: &str) -> OfferEmail {
        OfferEmail {
            offer_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            client_name: client_name.to_string(),
            client_email: "client@acme.example".to_string(),
            amount: dec("3000"),
            monthly_payment: dec("145"),
            signed_at: None,
            signer_name: None,
        }
    }

    fn line(title: &str, quantity: i32, monthly: &str) -> OfferEquipmentLine {
        OfferEquipmentLine {
            title: title.to_string(),
            quantity,
            monthly_payment_total: dec(monthly),
        }
    }

    #[test]
    fn offer_ready_lists_each_equipment_line() {
        let rendered = offer_ready(
            &offer("Anna Durand"),
            &[line("MacBook Pro 14", 2, "98.50"), line("Dock USB-C", 1, "4.20")],
        );

        assert_eq!(rendered.subject, "Votre offre de leasing est prête");
        assert!(rendered.body_text.contains("Bonjour Anna Durand,"));
        assert!(rendered
            .body_text
            .contains("- 2 x MacBook Pro 14 : 98,50\u{a0}€/mois"));
        assert!(rendered.body_text.contains("- 1 x Dock USB-C : 4,20\u{a0}€/mois"));
        assert!(rendered.body_html.contains("MacBook Pro 14"));
        assert!(rendered.body_html.contains("Dock USB-C"));
    }

    #[test]
    fn amounts_use_the_platform_format() {
        let mut big = offer("Anna Durand");
        big.amount = dec("1234567.891");
        let rendered = offer_ready(&big, &[]);

        assert!(rendered
            .body_text
            .contains("Montant financé : 1\u{a0}234\u{a0}567,89\u{a0}€"));
        assert!(rendered.body_html.contains("1\u{a0}234\u{a0}567,89\u{a0}€"));
    }

    #[test]
    fn html_special_characters_are_escaped() {
        let rendered = offer_ready(
            &offer("Durand & Fils <SA>"),
            &[line("Écran 27\" <4K>", 1, "12.00")],
        );

        assert!(rendered.body_html.contains("Durand &amp; Fils &lt;SA&gt;"));
        assert!(rendered.body_html.contains("Écran 27&quot; &lt;4K&gt;"));
        // The plain-text part keeps the raw characters
        assert!(rendered.body_text.contains("Durand & Fils <SA>"));
    }

    #[test]
    fn signed_email_names_the_signer_and_date() {
        let mut signed = offer("Anna Durand");
        signed.signer_name = Some("Marc Petit".to_string());
        signed.signed_at = Some(Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap());

        let rendered = offer_signed(&signed);
        assert_eq!(rendered.subject, "Votre offre a bien été signée");
        assert!(rendered.body_text.contains("signée par Marc Petit le 14/03/2025"));
    }

    #[test]
    fn signed_email_falls_back_to_the_client_name() {
        let mut signed = offer("Anna Durand");
        signed.signed_at = Some(Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap());

        let rendered = offer_signed(&signed);
        assert!(rendered.body_text.contains("signée par Anna Durand"));
    }

    #[test]
    fn welcome_mentions_the_company_and_contact() {
        let rendered = welcome("Acme Leasing", "Anna");
        assert_eq!(rendered.subject, "Bienvenue sur Leazr");
        assert!(rendered.body_text.contains("Bonjour Anna,"));
        assert!(rendered.body_text.contains("Le compte de Acme Leasing est maintenant actif"));
        assert!(rendered.body_html.contains("<strong>Acme Leasing</strong>"));
    }
}
