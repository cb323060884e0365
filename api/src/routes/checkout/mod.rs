pub mod checkout_route;
