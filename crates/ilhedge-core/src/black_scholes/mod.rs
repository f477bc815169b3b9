pub mod hedge_cost;
