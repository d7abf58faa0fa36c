#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use delivery_broker::clock::FixedClock;
use delivery_broker::config::Config;
use delivery_broker::gateways::mail::{Mail, MailGateway};
use delivery_broker::gateways::payment::PaymentGateway;
use delivery_broker::gateways::push::{PushGateway, PushMessage};
use delivery_broker::gateways::GatewayError;
use delivery_broker::models::order::{Address, GeoPoint, Order, OrderState, PaymentType};
use delivery_broker::models::user::{CreditCard, User};
use delivery_broker::state::AppState;

pub struct RecordingPush {
    pub messages: Mutex<Vec<PushMessage>>,
}

impl RecordingPush {
    pub fn new() -> Self {
        Self { messages: Mutex::new(Vec::new()) }
    }

    pub fn events_for(&self, recipient: Uuid) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|message| message.recipient == recipient)
            .map(|message| message.kind.name().to_string())
            .collect()
    }

    pub fn event_names(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|message| message.kind.name().to_string())
            .collect()
    }
}

impl PushGateway for RecordingPush {
    fn push(&self, message: PushMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

pub struct RecordingMailer {
    pub mails: Mutex<Vec<Mail>>,
    pub fail: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self { mails: Mutex::new(Vec::new()), fail: AtomicBool::new(false) }
    }

    pub fn sent(&self) -> Vec<Mail> {
        self.mails.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailGateway for RecordingMailer {
    async fn send(&self, mail: Mail) -> Result<(), GatewayError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::new("mail transport unavailable"));
        }
        self.mails.lock().unwrap().push(mail);
        Ok(())
    }
}

pub struct FakePaymentGateway {
    pub fail_authorise: AtomicBool,
    pub create_payment_calls: AtomicUsize,
    pub authorise_calls: AtomicUsize,
}

impl FakePaymentGateway {
    pub fn new() -> Self {
        Self {
            fail_authorise: AtomicBool::new(false),
            create_payment_calls: AtomicUsize::new(0),
            authorise_calls: AtomicUsize::new(0),
        }
    }

    pub fn payments_created(&self) -> usize {
        self.create_payment_calls.load(Ordering::SeqCst)
    }

    pub fn authorisations_attempted(&self) -> usize {
        self.authorise_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for FakePaymentGateway {
    async fn upload_credit_card(&self, _card: &CreditCard) -> Result<String, GatewayError> {
        Ok(format!("card-{}", Uuid::new_v4()))
    }

    async fn load_credit_card(&self, _card_ref: &str) -> Result<String, GatewayError> {
        Ok("1234".to_string())
    }

    async fn create_payment(&self, order_id: Uuid, _amount: f64) -> Result<String, GatewayError> {
        self.create_payment_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("payment-{order_id}"))
    }

    async fn create_card_token(&self, _card_ref: &str) -> Result<String, GatewayError> {
        Ok("token".to_string())
    }

    async fn authorise(
        &self,
        _payment_ref: &str,
        _token: &str,
        _amount: f64,
    ) -> Result<(), GatewayError> {
        self.authorise_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_authorise.load(Ordering::SeqCst) {
            return Err(GatewayError::new("authorization declined by gateway"));
        }
        Ok(())
    }
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub clock: Arc<FixedClock>,
    pub push: Arc<RecordingPush>,
    pub mailer: Arc<RecordingMailer>,
    pub gateway: Arc<FakePaymentGateway>,
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn harness() -> Harness {
    let clock = Arc::new(FixedClock::new(base_time()));
    let push = Arc::new(RecordingPush::new());
    let mailer = Arc::new(RecordingMailer::new());
    let gateway = Arc::new(FakePaymentGateway::new());
    let (events_tx, _unused_rx) = broadcast::channel(64);

    let state = Arc::new(AppState::new(
        Config::default(),
        clock.clone(),
        push.clone(),
        mailer.clone(),
        gateway.clone(),
        events_tx,
    ));

    Harness { state, clock, push, mailer, gateway }
}

pub fn pickup_point() -> GeoPoint {
    GeoPoint { lat: 55.6761, lng: 12.5683 }
}

pub fn delivery_point() -> GeoPoint {
    GeoPoint { lat: 55.6869, lng: 12.5950 }
}

/// A point a couple of streets away from both addresses (> 250 m).
pub fn distant_point() -> GeoPoint {
    GeoPoint { lat: 55.6600, lng: 12.5400 }
}

pub fn seed_user(state: &AppState, name: &str) -> User {
    let handle = name.to_lowercase().replace(' ', ".");
    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{handle}@example.com"),
        mobile: "12345678".to_string(),
        description: None,
        avatar: None,
        orders: Vec::new(),
        bids: Vec::new(),
        credit_card: None,
        active_deliverer: true,
        ratings: Vec::new(),
    };
    state.store.users.insert(user.id, user.clone());
    user
}

pub fn give_card(state: &AppState, user_id: Uuid) {
    state
        .store
        .users
        .update(&user_id, |user| user.credit_card = Some("card-seeded".to_string()));
}

pub fn seed_order_between(
    state: &AppState,
    owner: &User,
    pickup: GeoPoint,
    delivery: GeoPoint,
) -> Order {
    let order = Order {
        id: Uuid::new_v4(),
        description: "A crate of apples".to_string(),
        pickup_address: Address { name: "Market".to_string(), coordinate: pickup },
        delivery_address: Address { name: "Home".to_string(), coordinate: delivery },
        cost: Some(200.0),
        delivery_price: 100.0,
        delivery_window: None,
        payment_type: PaymentType::Cash,
        expensive: false,
        state: OrderState::Pending,
        bids: Vec::new(),
        accepted_bid: None,
        scheduled_delivery_time: None,
        location: None,
        created_at: base_time(),
    };
    state.store.orders.insert(order.id, order.clone());
    state
        .store
        .users
        .update(&owner.id, |user| user.orders.push(order.id));
    order
}

pub fn seed_order(state: &AppState, owner: &User) -> Order {
    seed_order_between(state, owner, pickup_point(), delivery_point())
}
