use aula_market_engine::{
    catalog_objects::EventDetail,
    db_types::{Cents, NewCourse, NewEventListing, NewOrder, NewProduct, NewUser, Order, OrderStatusType},
    traits::{CatalogManagement, OrderManagement},
};
use chrono::{Duration, Utc};
use cucumber::{given, then, when};

use crate::cucumber::MarketWorld;

#[given(expr = "a customer named {word} with email {word}")]
async fn create_customer(world: &mut MarketWorld, name: String, email: String) {
    let user = world.profiles().create_user(NewUser::new(email, name.clone())).await.expect("Error creating user");
    world.users.insert(name, user);
}

#[given(expr = "a course {string} priced at {int} cents")]
async fn add_course(world: &mut MarketWorld, title: String, price: i64) {
    let course = world
        .catalog()
        .add_course(NewCourse::new(title.clone(), Cents::from(price)))
        .await
        .expect("Error adding course");
    world.courses.insert(title, course.id);
}

#[given(expr = "a product {string} priced at {int} cents")]
async fn add_product(world: &mut MarketWorld, title: String, price: i64) {
    let product = world
        .catalog()
        .add_product(NewProduct::new(title.clone(), Cents::from(price)))
        .await
        .expect("Error adding product");
    world.products.insert(title, product.id);
}

#[given(expr = "an event {string} priced at {int} cents with {int} seats")]
async fn add_event(world: &mut MarketWorld, title: String, price: i64, seats: i64) {
    let starts_at = Utc::now() + Duration::days(14);
    let listing = NewEventListing::new(title.clone(), Cents::from(price), starts_at, seats);
    let event = world.catalog().add_event_listing(listing).await.expect("Error adding event");
    world.events.insert(title, event.id);
}

async fn place_order(world: &mut MarketWorld, order: NewOrder) {
    let result = world.api().process_new_order(order).await;
    match result {
        Ok(order) => {
            world.last_order = Some(order.order.id);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when(expr = "{word} orders the course {string}")]
async fn order_course(world: &mut MarketWorld, name: String, title: String) {
    let order = NewOrder::new(world.user(&name).id).with_course(world.course_id(&title));
    place_order(world, order).await;
}

#[when(expr = "{word} orders {int} of the product {string}")]
async fn order_product(world: &mut MarketWorld, name: String, quantity: i64, title: String) {
    let order = NewOrder::new(world.user(&name).id).with_product(world.product_id(&title), quantity);
    place_order(world, order).await;
}

#[when(expr = "{word} books {int} seat(s) at {string}")]
async fn book_seats(world: &mut MarketWorld, name: String, seats: i64, title: String) {
    let order = NewOrder::new(world.user(&name).id).with_event(world.event_id(&title), seats);
    place_order(world, order).await;
}

#[when(expr = "a payment intent [{word}] is attached to the last order")]
async fn attach_intent(world: &mut MarketWorld, intent_id: String) {
    let order_id = world.order_id();
    let _res = world.api().attach_payment_intent(order_id, &intent_id).await.expect("Error attaching payment intent");
}

#[when(expr = "payment [{word}] confirms")]
async fn confirm_payment(world: &mut MarketWorld, intent_id: String) {
    let _res = world.api().confirm_payment(&intent_id).await.expect("Error confirming payment");
}

#[when(expr = "the last order is cancelled because {string}")]
async fn cancel_order(world: &mut MarketWorld, reason: String) {
    let order_id = world.order_id();
    let _res = world.api().cancel_order(order_id, &reason).await.expect("Error cancelling order");
}

#[when(expr = "the last order is refunded because {string}")]
async fn refund_order(world: &mut MarketWorld, reason: String) {
    let order_id = world.order_id();
    let _res = world.api().refund_order(order_id, &reason).await.expect("Error refunding order");
}

#[when(expr = "{word} switches the site language to {word}")]
async fn switch_language(world: &mut MarketWorld, name: String, language: String) {
    let user_id = world.user(&name).id;
    let result = world.profiles().update_preferred_language(user_id, &language).await;
    match result {
        Ok(profile) => {
            if let Some(user) = world.users.get_mut(&name) {
                user.preferred_language = profile.preferred_language;
            }
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

async fn fetch_last_order(world: &mut MarketWorld) -> Order {
    let order_id = world.order_id();
    world.api().db().fetch_order_by_id(order_id).await.expect("Error fetching order").expect("Order does not exist")
}

#[then(expr = "the last order has status {word}")]
async fn check_order_status(world: &mut MarketWorld, status: String) {
    let order = fetch_last_order(world).await;
    assert_eq!(order.status, OrderStatusType::from(status), "Status is incorrect");
}

#[then(expr = "the last order totals {int} cents")]
async fn check_order_total(world: &mut MarketWorld, total: i64) {
    let order = fetch_last_order(world).await;
    assert_eq!(order.total, Cents::from(total), "Order total is incorrect");
}

#[then(expr = "the event {string} has {int} seat(s) left")]
async fn check_seats_left(world: &mut MarketWorld, title: String, seats: i64) {
    let event_id = world.event_id(&title);
    let event = world
        .api()
        .db()
        .fetch_event_listing(event_id)
        .await
        .expect("Error fetching event")
        .expect("Event does not exist");
    assert_eq!(event.available_spots, seats, "Available seats is incorrect");
}

#[then(expr = "the course {string} has {int} enrollment(s)")]
async fn check_enrollments(world: &mut MarketWorld, title: String, count: i64) {
    let course_id = world.course_id(&title);
    let course =
        world.api().db().fetch_course(course_id).await.expect("Error fetching course").expect("Course does not exist");
    assert_eq!(course.enrollment_count, count, "Enrollment count is incorrect");
}

#[then(expr = "the product {string} has {int} download(s)")]
async fn check_downloads(world: &mut MarketWorld, title: String, count: i64) {
    let product_id = world.product_id(&title);
    let product = world
        .api()
        .db()
        .fetch_product(product_id)
        .await
        .expect("Error fetching product")
        .expect("Product does not exist");
    assert_eq!(product.download_count, count, "Download count is incorrect");
}

#[then(expr = "the request is rejected with {string}")]
async fn check_rejection(world: &mut MarketWorld, message: String) {
    let error = world.last_error.as_ref().expect("The request was not rejected");
    assert!(error.contains(&message), "Expected '{message}' in '{error}'");
}

#[then(expr = "the stored language for {word} is {word}")]
async fn check_stored_language(world: &mut MarketWorld, name: String, language: String) {
    let user_id = world.user(&name).id;
    let stored = world.profiles().preferred_language(user_id).await.expect("Error fetching language preference");
    assert_eq!(stored.to_string(), language, "Language preference is incorrect");
}

async fn fetch_event_detail(world: &mut MarketWorld, name: &str, title: &str) -> EventDetail {
    let locale = world.user(name).preferred_language;
    let event_id = world.event_id(title);
    world.catalog().event_detail(event_id, locale).await.expect("Error fetching event detail")
}

#[then(expr = "{word} sees the event {string} button as {string}")]
async fn check_booking_label(world: &mut MarketWorld, name: String, title: String, label: String) {
    let detail = fetch_event_detail(world, &name, &title).await;
    assert_eq!(detail.booking_label, label, "Booking label is incorrect");
}

#[then(expr = "{word} sees the event {string} priced as {string}")]
async fn check_event_price(world: &mut MarketWorld, name: String, title: String, price: String) {
    let detail = fetch_event_detail(world, &name, &title).await;
    assert_eq!(detail.display_price, price, "Display price is incorrect");
}
