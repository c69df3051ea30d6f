/*
    Tests for the core_chat subsystem
*/
