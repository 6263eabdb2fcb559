//! In-memory document store backed by DashMap.
//!
//! Implements the customer, campaign and delivery-log collaborator traits
//! plus the customer/order ingestion the dashboard relies on. A production
//! deployment swaps this for a database-backed implementation of the same
//! traits.

use async_trait::async_trait;
use campaign_core::config::StoreConfig;
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::query::QueryDescriptor;
use campaign_core::store::{CampaignStore, CustomerStore, DeliveryLogStore};
use campaign_core::types::{
    Campaign, CampaignPatch, Customer, CustomerSnapshot, DeliveryLog, DeliveryStatus, Order,
    OrderStatus,
};
use campaign_segmentation::SpendRollup;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    CustomerInput, DashboardStats, OrderInput, OrdersPage, PageQuery, Pagination,
};

/// Thread-safe in-memory store for customers, orders, campaigns and delivery logs.
pub struct MemoryStore {
    customers: DashMap<String, Customer>,
    orders: DashMap<String, Order>,
    campaigns: DashMap<Uuid, Campaign>,
    logs: DashMap<Uuid, DeliveryLog>,
    open: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            customers: DashMap::new(),
            orders: DashMap::new(),
            campaigns: DashMap::new(),
            logs: DashMap::new(),
            open: AtomicBool::new(true),
        }
    }

    pub fn with_config(config: &StoreConfig) -> Self {
        let store = Self::new();
        info!(
            seed_demo_data = config.seed_demo_data,
            "Campaign store initialized (in-memory)"
        );
        if config.seed_demo_data {
            store.seed_demo_data();
        }
        store
    }

    /// Stop serving requests; every later call fails with `StoreUnavailable`.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        info!("Campaign store closed");
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> CampaignResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(CampaignError::StoreUnavailable(
                "store connection is closed".to_string(),
            ))
        }
    }

    fn snapshots(&self) -> Vec<CustomerSnapshot> {
        let orders: Vec<Order> = self.orders.iter().map(|r| r.value().clone()).collect();
        let rollup = SpendRollup::from_orders(&orders);
        let mut snapshots: Vec<CustomerSnapshot> = self
            .customers
            .iter()
            .map(|r| rollup.snapshot(r.value()))
            .collect();
        snapshots.sort_by(|a, b| a.customer_id.cmp(&b.customer_id));
        snapshots
    }

    // ─── Customers ─────────────────────────────────────────────────────────

    pub fn list_customers(&self) -> CampaignResult<Vec<Customer>> {
        self.ensure_open()?;
        let mut customers: Vec<Customer> =
            self.customers.iter().map(|r| r.value().clone()).collect();
        customers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(customers)
    }

    /// Insert or update customers, matching existing records by email or id.
    /// All inputs are validated before any is written.
    pub fn upsert_customers(&self, inputs: Vec<CustomerInput>) -> CampaignResult<Vec<Customer>> {
        self.ensure_open()?;
        for input in &inputs {
            validate_customer(input)?;
        }

        let now = Utc::now();
        let mut saved = Vec::with_capacity(inputs.len());
        for input in inputs {
            let existing_id = self
                .customers
                .iter()
                .find(|r| {
                    r.value().email == input.email
                        || input.customer_id.as_deref() == Some(r.key().as_str())
                })
                .map(|r| r.key().clone());

            let customer = match existing_id.and_then(|id| self.customers.get_mut(&id)) {
                Some(mut entry) => {
                    let c = entry.value_mut();
                    c.name = input.name;
                    if let Some(phone) = input.phone.filter(|p| !p.is_empty()) {
                        c.phone = phone;
                    }
                    if let Some(visits) = input.visit_count {
                        c.visit_count = visits;
                    }
                    if let Some(last_active) = input.last_active {
                        c.last_active = last_active;
                    }
                    c.updated_at = now;
                    c.clone()
                }
                None => {
                    let customer = Customer {
                        customer_id: input
                            .customer_id
                            .filter(|id| !id.is_empty())
                            .unwrap_or_else(|| generate_id("CUST")),
                        name: input.name,
                        email: input.email,
                        phone: input.phone.unwrap_or_default(),
                        visit_count: input.visit_count.unwrap_or(1),
                        last_active: input.last_active.unwrap_or(now),
                        created_at: now,
                        updated_at: now,
                    };
                    self.customers
                        .insert(customer.customer_id.clone(), customer.clone());
                    customer
                }
            };
            saved.push(customer);
        }
        Ok(saved)
    }

    // ─── Orders ────────────────────────────────────────────────────────────

    /// Record orders, skipping malformed entries. Each order bumps the
    /// customer's visit count and activity timestamp.
    pub fn create_orders(&self, inputs: Vec<OrderInput>) -> CampaignResult<Vec<Order>> {
        self.ensure_open()?;
        let now = Utc::now();
        let mut created = Vec::new();

        for input in inputs {
            if input.customer_id.is_empty()
                || input.customer_name.is_empty()
                || !(input.amount.is_finite() && input.amount > 0.0)
            {
                warn!(customer_id = %input.customer_id, "Skipping invalid order");
                continue;
            }

            let order = Order {
                order_id: generate_id("ORD"),
                customer_id: input.customer_id,
                customer_name: input.customer_name,
                amount: input.amount,
                status: OrderStatus::Completed,
                order_date: input.order_date.unwrap_or(now),
                description: input.description,
                created_at: now,
            };
            self.orders.insert(order.order_id.clone(), order.clone());

            if let Some(mut customer) = self.customers.get_mut(&order.customer_id) {
                customer.visit_count += 1;
                customer.last_active = now;
                customer.updated_at = now;
            }
            created.push(order);
        }

        if created.is_empty() {
            return Err(CampaignError::Validation(
                "no valid orders were created".to_string(),
            ));
        }
        Ok(created)
    }

    pub fn update_order_status(&self, order_id: &str, status: OrderStatus) -> CampaignResult<Order> {
        self.ensure_open()?;
        let mut entry = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| CampaignError::NotFound(format!("order {order_id}")))?;
        entry.status = status;
        Ok(entry.clone())
    }

    pub fn list_orders(&self, page: &PageQuery) -> CampaignResult<OrdersPage> {
        self.ensure_open()?;
        let limit = page.limit.max(1);
        let current_page = page.page.max(1);

        let mut orders: Vec<Order> = self.orders.iter().map(|r| r.value().clone()).collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total_orders = orders.len();
        let total_pages = total_orders.div_ceil(limit);
        let orders = orders
            .into_iter()
            .skip(current_page.saturating_sub(1).saturating_mul(limit))
            .take(limit)
            .collect();

        Ok(OrdersPage {
            orders,
            pagination: Pagination {
                current_page,
                total_pages,
                total_orders,
                has_next: current_page < total_pages,
                has_prev: current_page > 1,
            },
        })
    }

    // ─── Dashboard ─────────────────────────────────────────────────────────

    pub fn dashboard_stats(&self) -> CampaignResult<DashboardStats> {
        self.ensure_open()?;
        Ok(DashboardStats {
            total_customers: self.customers.len() as u64,
            total_orders: self.orders.len() as u64,
            total_campaigns: self.campaigns.len() as u64,
            total_revenue: self.orders.iter().map(|r| r.value().amount).sum(),
        })
    }

    // ─── Seed Data ─────────────────────────────────────────────────────────

    fn seed_demo_data(&self) {
        let now = Utc::now();
        let demo = [
            ("CUST-DEMO-1", "Ava Martin", "ava@example.com", 12, 3, 6200.0),
            ("CUST-DEMO-2", "Noah Silva", "noah@example.com", 2, 210, 450.0),
            ("CUST-DEMO-3", "Mia Chen", "mia@example.com", 7, 45, 12800.0),
            ("CUST-DEMO-4", "Leo Okafor", "leo@example.com", 1, 400, 0.0),
        ];
        for (id, name, email, visits, idle_days, spend) in demo {
            self.customers.insert(
                id.to_string(),
                Customer {
                    customer_id: id.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                    phone: String::new(),
                    visit_count: visits,
                    last_active: now - Duration::days(idle_days),
                    created_at: now,
                    updated_at: now,
                },
            );
            if spend > 0.0 {
                let order = Order {
                    order_id: generate_id("ORD"),
                    customer_id: id.to_string(),
                    customer_name: name.to_string(),
                    amount: spend,
                    status: OrderStatus::Completed,
                    order_date: now - Duration::days(idle_days),
                    description: "Seed order".to_string(),
                    created_at: now,
                };
                self.orders.insert(order.order_id.clone(), order);
            }
        }
        info!(customers = demo.len(), "Seeded demo customers");
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_customer(input: &CustomerInput) -> CampaignResult<()> {
    if input.name.trim().is_empty() || input.email.trim().is_empty() {
        return Err(CampaignError::Validation(
            "name and email are required".to_string(),
        ));
    }
    if !is_valid_email(&input.email) {
        return Err(CampaignError::Validation(format!(
            "invalid email format: {}",
            input.email
        )));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

/// `<PREFIX>-<unix millis>-<9 random chars>`
fn generate_id(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{prefix}-{}-{suffix}", Utc::now().timestamp_millis())
}

// ─── Collaborator traits ───────────────────────────────────────────────────

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn find(&self, query: &QueryDescriptor) -> CampaignResult<Vec<CustomerSnapshot>> {
        self.ensure_open()?;
        Ok(self
            .snapshots()
            .into_iter()
            .filter(|c| query.matches(c))
            .collect())
    }

    async fn count(&self, query: &QueryDescriptor) -> CampaignResult<u64> {
        self.ensure_open()?;
        Ok(self.snapshots().iter().filter(|c| query.matches(c)).count() as u64)
    }

    async fn scan(&self) -> CampaignResult<Vec<CustomerSnapshot>> {
        self.ensure_open()?;
        Ok(self.snapshots())
    }
}

#[async_trait]
impl CampaignStore for MemoryStore {
    async fn create(&self, campaign: &Campaign) -> CampaignResult<Uuid> {
        self.ensure_open()?;
        self.campaigns.insert(campaign.id, campaign.clone());
        Ok(campaign.id)
    }

    async fn update(&self, id: Uuid, patch: CampaignPatch) -> CampaignResult<Campaign> {
        self.ensure_open()?;
        let mut entry = self
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| CampaignError::NotFound(format!("campaign {id}")))?;
        entry.value_mut().apply(&patch)?;
        Ok(entry.value().clone())
    }

    async fn get(&self, id: Uuid) -> CampaignResult<Option<Campaign>> {
        self.ensure_open()?;
        Ok(self.campaigns.get(&id).map(|r| r.value().clone()))
    }

    async fn list(&self) -> CampaignResult<Vec<Campaign>> {
        self.ensure_open()?;
        let mut campaigns: Vec<Campaign> =
            self.campaigns.iter().map(|r| r.value().clone()).collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(campaigns)
    }
}

#[async_trait]
impl DeliveryLogStore for MemoryStore {
    async fn create(&self, log: &DeliveryLog) -> CampaignResult<Uuid> {
        self.ensure_open()?;
        self.logs.insert(log.id, log.clone());
        Ok(log.id)
    }

    async fn update_by_external_reference(
        &self,
        reference: Uuid,
        status: DeliveryStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> CampaignResult<Option<DeliveryLog>> {
        self.ensure_open()?;
        Ok(self.logs.get_mut(&reference).map(|mut entry| {
            let log = entry.value_mut();
            log.status = status;
            log.delivered_at = delivered_at;
            log.clone()
        }))
    }

    async fn list_for_campaign(&self, campaign_id: Uuid) -> CampaignResult<Vec<DeliveryLog>> {
        self.ensure_open()?;
        let mut logs: Vec<DeliveryLog> = self
            .logs
            .iter()
            .filter(|r| r.value().campaign_id == campaign_id)
            .map(|r| r.value().clone())
            .collect();
        logs.sort_by(|a, b| a.sent_at.cmp(&b.sent_at));
        Ok(logs)
    }
}
