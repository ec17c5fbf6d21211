use aws_sdk_sesv2::types::{Body as SesBody, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;
use std::env;

use repvendas_atoms::orders::Order;

fn from_address() -> String {
    env::var("NOTIFY_FROM_EMAIL").unwrap_or_else(|_| "pedidos@repvendas.app".to_string())
}

fn order_body(store_name: &str, order: &Order) -> String {
    let mut lines = vec![
        format!("Novo pedido recebido em {}", store_name),
        String::new(),
        format!("Cliente: {}", order.client_name),
    ];
    if let Some(phone) = &order.client_phone {
        lines.push(format!("Telefone: {}", phone));
    }
    lines.push(String::new());
    for item in &order.items {
        lines.push(format!(
            "{} x{} - R$ {:.2}",
            item.product_name, item.quantity, item.unit_price
        ));
    }
    lines.push(String::new());
    lines.push(format!("Total: R$ {:.2}", order.total));
    lines.push(format!("Pedido: {}", order.order_id));
    lines.join("\n")
}

/// Send the new-order notification to the representative's configured
/// address.
pub async fn send_order_notification(
    ses_client: &SesClient,
    to: &str,
    store_name: &str,
    order: &Order,
) -> Result<(), String> {
    let subject = Content::builder()
        .data(format!("Novo pedido de {}", order.client_name))
        .charset("UTF-8")
        .build()
        .map_err(|e| format!("SES content build error: {}", e))?;

    let body_text = Content::builder()
        .data(order_body(store_name, order))
        .charset("UTF-8")
        .build()
        .map_err(|e| format!("SES content build error: {}", e))?;

    let message = Message::builder()
        .subject(subject)
        .body(SesBody::builder().text(body_text).build())
        .build();

    ses_client
        .send_email()
        .from_email_address(from_address())
        .destination(Destination::builder().to_addresses(to).build())
        .content(EmailContent::builder().simple(message).build())
        .send()
        .await
        .map_err(|e| format!("SES send_email error: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::order_body;
    use repvendas_atoms::orders::{Order, OrderItem};

    #[test]
    fn order_body_lists_items_and_total() {
        let order = Order {
            order_id: "o-1".to_string(),
            user_id: "u-1".to_string(),
            client_name: "Maria".to_string(),
            client_email: None,
            client_phone: Some("11 99999-0000".to_string()),
            status: "pending".to_string(),
            total: 250.0,
            items: vec![OrderItem {
                product_id: "p-1".to_string(),
                product_name: "Tênis Runner".to_string(),
                quantity: 2,
                unit_price: 125.0,
            }],
            notes: None,
            created_at: "2024-03-05T12:00:00Z".to_string(),
            updated_at: None,
        };

        let body = order_body("Loja da Ana", &order);
        assert!(body.contains("Loja da Ana"));
        assert!(body.contains("Tênis Runner x2"));
        assert!(body.contains("Total: R$ 250.00"));
        assert!(body.contains("11 99999-0000"));
    }
}
