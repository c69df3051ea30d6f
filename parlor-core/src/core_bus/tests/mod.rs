/*
    Tests for the core_bus subsystem
*/

pub mod bus_tests;
