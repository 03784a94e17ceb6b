pub mod mock_test_dto;
