mod common;

use std::collections::HashSet;

use anyhow::Result;
use helpdesk_api::domain::TicketStatus;
use helpdesk_api::error::ApiError;
use helpdesk_api::services::{CreateTicket, NewComment, UpdateTicket};
use helpdesk_api::store::TicketStore;

fn ticket_dto(w: &common::World, title: &str) -> CreateTicket {
    CreateTicket {
        title: title.to_string(),
        description: "integration".to_string(),
        priority: None,
        category_id: w.centro_category.id,
        due_date: None,
        assignee_id: None,
    }
}

#[tokio::test]
async fn numbering_is_per_tenant_and_gapless() -> Result<()> {
    let w = common::world().await?;

    for expected in ["001", "002", "003"] {
        let t = w
            .state
            .tickets
            .create(ticket_dto(&w, "centro"), w.centro_user.id)
            .await?;
        assert_eq!(t.number, expected);
    }

    // A different tenant starts its own sequence at 001
    let mc_category = {
        use helpdesk_api::domain::TicketCategory;
        use helpdesk_api::store::CategoryStore;
        let now = chrono::Utc::now();
        let category = TicketCategory {
            id: uuid::Uuid::new_v4(),
            name: "Geral".to_string(),
            description: None,
            color: None,
            icon: None,
            sla_hours: None,
            is_active: true,
            tenant_id: w.mcdonalds_hq.id,
            created_at: now,
            updated_at: now,
        };
        w.store.insert_category(category.clone()).await?;
        category
    };
    let t = w
        .state
        .tickets
        .create(
            CreateTicket {
                category_id: mc_category.id,
                ..ticket_dto(&w, "mcdonalds")
            },
            w.mcdonalds_admin.id,
        )
        .await?;
    assert_eq!(t.number, "001");
    Ok(())
}

#[tokio::test]
async fn concurrent_creations_get_distinct_gapless_numbers() -> Result<()> {
    let w = common::world().await?;
    let n = 20;

    let mut handles = Vec::new();
    for i in 0..n {
        let tickets = w.state.tickets.clone();
        let dto = ticket_dto(&w, &format!("burst-{}", i));
        let creator = w.centro_user.id;
        handles.push(tokio::spawn(
            async move { tickets.create(dto, creator).await },
        ));
    }

    let mut numbers = HashSet::new();
    for handle in handles {
        let ticket = handle.await??;
        numbers.insert(ticket.number);
    }

    assert_eq!(numbers.len(), n);
    for i in 1..=n {
        assert!(numbers.contains(&format!("{:03}", i)), "missing {:03}", i);
    }
    Ok(())
}

#[tokio::test]
async fn lifecycle_walk_stamps_timestamps_once() -> Result<()> {
    let w = common::world().await?;
    let admin = w.caller(&w.centro_admin);
    let ticket = w
        .state
        .tickets
        .create(ticket_dto(&w, "lifecycle"), w.centro_user.id)
        .await?;

    let step = |status| UpdateTicket {
        status: Some(status),
        ..Default::default()
    };

    let t = w
        .state
        .tickets
        .update(ticket.id, step(TicketStatus::InProgress), admin)
        .await?;
    assert!(t.resolved_at.is_none());

    let t = w
        .state
        .tickets
        .update(ticket.id, step(TicketStatus::Resolved), admin)
        .await?;
    let resolved_stamp = t.resolved_at.expect("resolved_at");

    let t = w
        .state
        .tickets
        .update(ticket.id, step(TicketStatus::Closed), admin)
        .await?;
    let closed_stamp = t.closed_at.expect("closed_at");

    // Reopening and resolving again keeps the original stamps
    w.state
        .tickets
        .update(ticket.id, step(TicketStatus::Open), admin)
        .await?;
    let t = w
        .state
        .tickets
        .update(ticket.id, step(TicketStatus::Resolved), admin)
        .await?;
    assert_eq!(t.resolved_at, Some(resolved_stamp));
    assert_eq!(t.closed_at, Some(closed_stamp));
    Ok(())
}

#[tokio::test]
async fn franchisor_admin_works_child_tickets_but_not_other_brands() -> Result<()> {
    let w = common::world().await?;
    let ticket = w
        .state
        .tickets
        .create(ticket_dto(&w, "cross-level"), w.centro_user.id)
        .await?;

    let listed = w
        .state
        .tickets
        .list_for_tenant(w.lacoste_centro.id, w.caller(&w.lacoste_admin))
        .await?;
    assert_eq!(listed.len(), 1);

    let err = w
        .state
        .tickets
        .get(ticket.id, w.caller(&w.mcdonalds_admin))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));
    Ok(())
}

#[tokio::test]
async fn requester_sees_only_public_comments() -> Result<()> {
    let w = common::world().await?;
    let ticket = w
        .state
        .tickets
        .create(ticket_dto(&w, "comments"), w.centro_user.id)
        .await?;
    let agent = w.caller(&w.centro_agent);

    w.state
        .tickets
        .add_comment(
            ticket.id,
            NewComment {
                content: "estamos verificando".to_string(),
                is_internal: false,
            },
            agent,
        )
        .await?;
    w.state
        .tickets
        .add_comment(
            ticket.id,
            NewComment {
                content: "cliente complicado".to_string(),
                is_internal: true,
            },
            agent,
        )
        .await?;

    let requester_view = w
        .state
        .tickets
        .list_comments(ticket.id, w.caller(&w.centro_user))
        .await?;
    assert_eq!(requester_view.len(), 1);
    assert!(!requester_view[0].is_internal);

    // Requesters also cannot write internal comments
    let err = w
        .state
        .tickets
        .add_comment(
            ticket.id,
            NewComment {
                content: "sneaky".to_string(),
                is_internal: true,
            },
            w.caller(&w.centro_user),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));
    Ok(())
}

#[tokio::test]
async fn deletion_is_admin_only_and_leaves_the_audit_trail() -> Result<()> {
    let w = common::world().await?;
    let ticket = w
        .state
        .tickets
        .create(ticket_dto(&w, "doomed"), w.centro_user.id)
        .await?;

    for user in [&w.centro_agent, &w.centro_user] {
        let err = w
            .state
            .tickets
            .remove(ticket.id, w.caller(user))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    w.state
        .tickets
        .remove(ticket.id, w.caller(&w.centro_admin))
        .await?;
    assert!(w.store.ticket_by_id(ticket.id).await?.is_none());

    let history = w
        .state
        .logs
        .list_for_ticket(ticket.id, w.caller(&w.centro_admin))
        .await?;
    assert!(history.iter().any(|e| e.action == "TICKET_DELETED"));
    Ok(())
}

#[tokio::test]
async fn stats_aggregate_by_brand_for_crown() -> Result<()> {
    let w = common::world().await?;
    for i in 0..3 {
        w.state
            .tickets
            .create(ticket_dto(&w, &format!("s{}", i)), w.centro_user.id)
            .await?;
    }

    let stats = w.state.tickets.stats(w.caller(&w.crown_admin)).await?;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_status.get("OPEN"), Some(&3));

    let brand_counts = w
        .state
        .tickets
        .stats_by_brand(w.caller(&w.crown_admin))
        .await?;
    let centro_row = brand_counts
        .iter()
        .find(|row| row.tenant_id == w.lacoste_centro.id)
        .expect("centro row");
    assert_eq!(centro_row.ticket_count, 3);
    assert_eq!(centro_row.brand.as_deref(), Some("Lacoste"));
    Ok(())
}
